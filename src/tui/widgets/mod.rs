pub mod calendar_view;
pub mod color;
pub mod confirm;
pub mod form;
pub mod genre_table;
pub mod help;
pub mod status_bar;
pub mod tabs;
