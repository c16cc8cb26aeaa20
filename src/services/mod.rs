pub mod checksum;
pub mod groups;
pub mod init;
pub mod lifecycle;
pub mod photos;
pub mod rotation;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;
