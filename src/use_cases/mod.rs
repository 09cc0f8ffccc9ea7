pub mod admin_access;
pub mod admin_guests;
pub mod registry;
pub mod session;
pub mod submissions;

#[cfg(test)]
pub(crate) mod test_support;
