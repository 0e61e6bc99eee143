pub mod path_source;
