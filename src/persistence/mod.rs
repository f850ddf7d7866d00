pub mod journal;
pub mod json_lines;
