pub mod datacenter;
