pub mod batch_job_routes;
