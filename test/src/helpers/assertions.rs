/// Assert that two peers bound the same id to nodes of the same kind at the
/// same position, within `tolerance`
#[macro_export]
macro_rules! assert_node_synced {
    ($host:expr, $client:expr, $id:expr, $tolerance:expr) => {{
        use dewdrop_shared::GameWorld;

        let host_node = $host
            .node($id)
            .unwrap_or_else(|| panic!("{} has no node {}", $host.id, $id));
        let client_node = $client
            .node($id)
            .unwrap_or_else(|| panic!("{} has no node {}", $client.id, $id));
        assert_eq!(
            $host.world.node_kind(&host_node),
            $client.world.node_kind(&client_node),
            "Node {} has a different kind on {} and {}",
            $id,
            $host.id,
            $client.id
        );

        let host_position = $host.world.position(&host_node).unwrap();
        let client_position = $client.world.position(&client_node).unwrap();
        assert!(
            host_position.distance(&client_position) <= $tolerance,
            "Node {} is at {:?} on {} but {:?} on {}",
            $id,
            host_position,
            $host.id,
            client_position,
            $client.id
        );
    }};
}

/// Assert that every peer in the session agrees on `host`
#[macro_export]
macro_rules! assert_host_agreed {
    ($session:expr, $host:expr) => {
        for peer in $session.peers.iter() {
            assert_eq!(
                peer.host().as_ref().map(|host| host.as_str()),
                Some($host),
                "{} follows a different host",
                peer.id
            );
        }
    };
}
