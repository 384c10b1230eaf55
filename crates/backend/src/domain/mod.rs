pub mod a001_customer;
