// Batch request preparation for the Responses batch endpoint.
// Submission and polling happen outside this crate; these files are the hand-off.

pub mod correlation;
pub mod prepare;
pub mod requests;
