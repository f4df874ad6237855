pub mod module_api;
