pub mod catalog;
pub mod cell_mutator;
pub mod data_core;
pub mod key_path;
pub mod path_codec;
pub mod settings;
