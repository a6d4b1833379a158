//! Candidate generation
//!
//! Hosts are picked at random inside the configured scope; each host is then
//! expanded into every (port, path) pair the configuration describes.

use crate::{Candidate, Config};
use ipnet::Ipv4Net;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::Ipv4Addr;

/// Literal replaced by an index in templated output paths.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Number of concrete paths produced from one templated path.
pub const INDEX_EXPANSION: usize = 20;

/// Ports probed on every host before the configured range.
pub const FIXED_PORTS: [u16; 2] = [80, 88];

pub struct CandidateGenerator {
    rng: StdRng,
}

impl CandidateGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick an address uniformly over every network in `scope`.
    ///
    /// Returns `None` only for an empty scope.
    pub fn next_host(&mut self, scope: &[Ipv4Net]) -> Option<Ipv4Addr> {
        let total: u64 = scope.iter().map(network_size).sum();
        if total == 0 {
            return None;
        }

        let mut offset = self.rng.random_range(0..total);
        for network in scope {
            let size = network_size(network);
            if offset < size {
                let base = u32::from(network.network()) as u64;
                return Some(Ipv4Addr::from((base + offset) as u32));
            }
            offset -= size;
        }

        None
    }
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn network_size(network: &Ipv4Net) -> u64 {
    1u64 << (32 - u32::from(network.prefix_len()))
}

/// Ports for one host: 80 and 88 first, then `[low, high)` ascending.
pub fn expand_ports(port_range: (u16, u16)) -> impl Iterator<Item = u16> + Clone {
    let (low, high) = port_range;
    FIXED_PORTS.into_iter().chain(low..high)
}

/// Resolve `{index}` templates into concrete paths.
///
/// Plain paths keep their configured order; each templated path is dropped
/// and its 20 substitutions are appended after them.
pub fn expand_output_paths(output_paths: &[String]) -> Vec<String> {
    let (templated, plain): (Vec<&String>, Vec<&String>) = output_paths
        .iter()
        .partition(|path| path.contains(INDEX_PLACEHOLDER));

    plain
        .into_iter()
        .cloned()
        .chain(templated.into_iter().flat_map(|path| {
            (0..INDEX_EXPANSION).map(move |i| path.replace(INDEX_PLACEHOLDER, &i.to_string()))
        }))
        .collect()
}

/// Every candidate for `host` under `config`, in launch order.
///
/// Pure and deterministic: the same host and snapshot always produce the same
/// sequence.
pub fn expand(host: Ipv4Addr, config: &Config) -> impl Iterator<Item = Candidate> {
    let paths = expand_output_paths(&config.output_paths);

    expand_ports(config.port_range).flat_map(move |port| {
        paths
            .clone()
            .into_iter()
            .map(move |path| Candidate::new(host, port, path))
    })
}
