//! Bonus round state: a tagged sum of the two sub-state-machines
//! (spec.md §9: "Bonus-round state is a sum `{collective_list |
//! hot_button}` with a tag field").

pub mod collective_list;
pub mod hot_button;

use collective_list::ServerCollectiveListState;
use hot_button::ServerHotButtonState;

#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "bonus_type", rename_all = "snake_case")]
pub enum BonusRoundState {
    CollectiveList(ServerCollectiveListState),
    HotButton(ServerHotButtonState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    CollectiveList,
    HotButton,
}

impl BonusRoundState {
    pub fn bonus_type(&self) -> BonusType {
        match self {
            Self::CollectiveList(_) => BonusType::CollectiveList,
            Self::HotButton(_) => BonusType::HotButton,
        }
    }
}
