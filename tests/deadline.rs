/*!
 * Deadline subsystem tests entry point
 */

#[path = "deadline/executor_test.rs"]
mod executor_test;

#[path = "deadline/race_test.rs"]
mod race_test;

#[path = "deadline/leak_test.rs"]
mod leak_test;

#[path = "deadline/interrupt_test.rs"]
mod interrupt_test;

#[path = "deadline/property_test.rs"]
mod property_test;
