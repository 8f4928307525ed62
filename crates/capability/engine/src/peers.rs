//! 每个设备实例的对端集合

use devsim_protocol::Peer;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock};

/// 按设备分组的对端表，同一地址只登记一次。
#[derive(Default)]
pub(crate) struct PeerRegistry {
    devices: RwLock<HashMap<String, Vec<Peer>>>,
}

impl PeerRegistry {
    /// 登记对端，返回是否为新对端。
    pub fn insert(&self, device_id: &str, peer: &Peer) -> bool {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        let peers = devices.entry(device_id.to_string()).or_default();
        if peers.iter().any(|p| p.socket_addr() == peer.socket_addr()) {
            return false;
        }
        peers.push(peer.clone());
        true
    }

    pub fn remove(&self, device_id: &str, addr: SocketAddr) {
        let mut devices = self.devices.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(peers) = devices.get_mut(device_id) {
            peers.retain(|p| p.socket_addr() != addr);
        }
    }

    pub fn list(&self, device_id: &str) -> Vec<Peer> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear(&self, device_id: &str) -> usize {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(device_id)
            .map_or(0, |peers| peers.len())
    }
}
