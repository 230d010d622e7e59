pub mod block;
pub mod card;
pub mod deck;
pub mod deck_list;
pub mod lookup;
pub mod stats;
