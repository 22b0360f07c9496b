pub mod isolation_forest;
