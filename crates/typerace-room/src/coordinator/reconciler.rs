//! Cleanup after a connection is lost.

use typerace_protocol::{ConnectionId, RoomCode, ServerEvent};
use tracing::info;

use super::Coordinator;

impl Coordinator {
    /// Reclaims everything `connection` owned.
    ///
    /// Closes its outbound queue, then removes it from every room it was
    /// in. A room left empty is deleted along with its pending deadline;
    /// any other room gets a `roomUpdated` with the new roster.
    ///
    /// Returns the codes of the rooms that lost a participant.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<RoomCode> {
        self.gateway.unregister(connection);

        let mut affected = Vec::new();
        for code in self.registry.codes() {
            let Some(room) = self.registry.lookup_mut(&code) else {
                continue;
            };
            if room.remove_connection(connection) == 0 {
                continue;
            }
            info!(room = %code, %connection, players = room.len(), "player left");

            if room.is_empty() {
                self.registry.delete(&code);
                self.forget_race(&code);
            } else {
                self.gateway
                    .to_room(room, &ServerEvent::RoomUpdated(room.snapshot()));
            }
            affected.push(code);
        }
        affected
    }
}

#[cfg(test)]
mod tests {
    use typerace_protocol::Phase;

    use crate::{Corpus, RaceConfig, RoomRegistry};

    use super::*;

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    fn coordinator() -> Coordinator {
        Coordinator::new(RoomRegistry::new(Corpus::default(), RaceConfig::default())).0
    }

    #[tokio::test]
    async fn test_last_participant_leaving_deletes_room() {
        let mut c = coordinator();
        let _rx = c.connect(conn(1));
        let code = c.create_room(conn(1), "Ann");

        assert_eq!(c.disconnect(conn(1)), vec![code.clone()]);
        assert!(c.registry().lookup(&code).is_none());
        assert!(!c.gateway().is_registered(conn(1)));
    }

    #[tokio::test]
    async fn test_remaining_participants_get_roster() {
        let mut c = coordinator();
        let _rx1 = c.connect(conn(1));
        let mut rx2 = c.connect(conn(2));
        let code = c.create_room(conn(1), "Ann");
        c.join(&code, "Bob", conn(2)).unwrap();
        while rx2.try_recv().is_ok() {}

        c.disconnect(conn(1));

        match rx2.try_recv() {
            Ok(ServerEvent::RoomUpdated(room)) => {
                assert_eq!(room.players.len(), 1);
                assert_eq!(room.players[0].username, "Bob");
                assert_eq!(room.creator, "Ann");
            }
            other => panic!("expected roomUpdated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_emptied_racing_room_drops_its_deadline() {
        let mut c = coordinator();
        let _rx = c.connect(conn(1));
        let code = c.create_room(conn(1), "Ann");
        c.set_ready(&code, conn(1));
        let deadline = c.race_deadline(&code).unwrap();

        c.disconnect(conn(1));

        assert_eq!(c.active_races(), 0);
        assert!(!c.deadline_elapsed(&code, deadline));
    }

    #[tokio::test]
    async fn test_race_continues_when_someone_leaves() {
        let mut c = coordinator();
        let _rx1 = c.connect(conn(1));
        let _rx2 = c.connect(conn(2));
        let code = c.create_room(conn(1), "Ann");
        c.join(&code, "Bob", conn(2)).unwrap();
        c.set_ready(&code, conn(1));
        c.set_ready(&code, conn(2));

        c.disconnect(conn(2));

        let room = c.registry().lookup(&code).unwrap();
        assert_eq!(room.phase(), Phase::Racing);
        assert_eq!(c.active_races(), 1);
    }

    #[tokio::test]
    async fn test_unknown_connection_affects_nothing() {
        let mut c = coordinator();
        let _rx = c.connect(conn(1));
        c.create_room(conn(1), "Ann");

        assert!(c.disconnect(conn(42)).is_empty());
        assert_eq!(c.registry().len(), 1);
    }
}
