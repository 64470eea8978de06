pub mod dynamic_object_ext;
pub mod kube_client;
pub mod memory;
pub mod store;
