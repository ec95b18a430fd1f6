pub mod search;
pub mod serve;
pub mod show;
