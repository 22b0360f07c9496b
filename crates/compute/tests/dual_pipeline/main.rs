/// Integration tests for the dual anomaly pipeline covering the spam-caller
/// scenario, cardinality, reproducibility, top-K selection and failure modes.

mod failures;
mod helpers;
mod scenarios;
mod selection;
