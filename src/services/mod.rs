pub mod dicom_service;
pub mod enhancer;
pub mod record_store;
pub mod storage;
