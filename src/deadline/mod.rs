/*!
 * Deadline Records and Registry
 *
 * - Record: one in-flight operation and its write-once outcome cell
 * - Registry: the single shared structure through which outcomes are resolved
 */

pub mod record;
pub mod registry;

pub use record::DeadlineRecord;
pub use registry::ExecutionRegistry;
