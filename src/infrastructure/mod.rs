pub mod enhancer;
pub mod storage;
