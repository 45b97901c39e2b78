//! 🪣🚀🌐 S3 Backend — the bucket-to-bucket paratrooper.
//!
//! INT. SOMEONE'S MINIO BOX — NIGHT. A bucket sits there, half full, while its twin
//! across the network has everything. Someone typed `PUT` once and walked away.
//! The bytes have been waiting. Patient. Ready to be copied by a Rust process
//! that checks before it leaps.
//!
//! This module wraps the AWS S3 SDK behind [`ObjectStore`](super::ObjectStore).
//!
//! 🧠 Knowledge graph:
//! - Same pattern as `in_mem/`: config in, trait impl out, enum variant in `backends.rs`
//! - Listing: `ListObjectsV2` paginator → one page buffered → `next_key()`
//! - Exists: `HeadObject`, NotFound/404 → `false`, everything else → `Err`
//! - Fetch: `GetObject` → `ByteStream::collect()` → `Bytes`
//! - Store: one `PutObject` with the full body. No multipart, no half-written keys.
//!
//! 🦆 The duck has no clearance for AWS. It watches from the edge of the VPC.

mod s3_store;

pub(crate) use s3_store::{S3KeyListing, S3Store};
