mod ranked_list;
mod status_bar;

pub use ranked_list::RankedList;
pub use status_bar::StatusBar;
