pub mod output;
pub mod plot;
