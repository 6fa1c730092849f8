pub mod table;

pub use table::{read_csv, write_csv, Table, TableError};
