pub mod bold_service;
pub mod email_service;
pub mod storage_service;
