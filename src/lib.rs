pub mod allocator;
pub mod date_parse;
pub mod date_setter;
pub mod error;
pub mod exif;
pub mod exif_writer;
pub mod file_ops;
pub mod naming;
pub mod path_date;
pub mod report;
