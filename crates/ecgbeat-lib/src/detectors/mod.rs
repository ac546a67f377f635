pub mod delineate;
pub mod ecg;
