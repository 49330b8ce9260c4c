pub mod format;

pub use format::{format_nok, format_pct, format_usd, group_thousands};
