pub mod outcome_writer;
pub mod proof_artifacts;

pub use outcome_writer::OutcomeWriter;
pub use proof_artifacts::{sanitize_title, ArtifactEntry, ProofArtifacts};
