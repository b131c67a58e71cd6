// Resume uploads: the original PDF goes to the object store, its text to the
// document store, and a `resume_uploads` row links the two.

pub mod extract;
pub mod handlers;
pub mod storage;
pub mod store;
