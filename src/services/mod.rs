pub mod classify_service;
pub mod expand_service;
pub mod extract_service;
pub mod file_service;
pub mod reconcile_service;
pub mod scan_service;
pub mod structure_service;
pub mod template_service;
