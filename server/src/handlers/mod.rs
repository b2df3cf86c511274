pub mod job_handlers;
