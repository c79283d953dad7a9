use std::net::Ipv4Addr;

/// Drops traffic touching public addresses when `exclude_public` is set.
///
/// Private means 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddressFilter {
    pub exclude_public: bool,
}

impl AddressFilter {
    pub fn new(exclude_public: bool) -> Self {
        Self { exclude_public }
    }

    pub fn should_drop(&self, src: Ipv4Addr, dst: Ipv4Addr) -> bool {
        self.exclude_public && !(src.is_private() && dst.is_private())
    }
}
