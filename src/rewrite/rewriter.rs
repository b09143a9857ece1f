use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::codec::{BinaryReader, BinaryWriter, EntityId, InventoryTransaction};
use crate::error::Result;
use crate::protocol::{Direction, PacketId};
use crate::rewrite::strategy::{FieldKind, FieldSchema, IdEncoding, RewriteStrategy, StrategyTable, Tail};
use crate::rewrite::translator::EntityTranslator;

/// Result of rewriting one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Nothing changed; rewind the read cursor to this offset
    Unchanged { rewind_to: usize },
    /// New payload, read from the start
    Replaced(Bytes),
}

impl RewriteOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged { .. })
    }

    /// Payload to forward, given the buffer that was rewritten
    pub fn into_payload(self, original: &Bytes) -> Bytes {
        match self {
            Self::Unchanged { rewind_to } => original.slice(rewind_to.min(original.len())..),
            Self::Replaced(bytes) => bytes,
        }
    }
}

/// Rewrites entity id fields in game packet payloads
pub struct PacketRewriter {
    translator: Arc<EntityTranslator>,
    strategies: StrategyTable,
}

impl PacketRewriter {
    pub fn new(translator: Arc<EntityTranslator>) -> Self {
        Self::with_strategies(translator, StrategyTable::standard())
    }

    pub fn with_strategies(translator: Arc<EntityTranslator>, strategies: StrategyTable) -> Self {
        Self { translator, strategies }
    }

    pub fn translator(&self) -> &Arc<EntityTranslator> {
        &self.translator
    }

    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    /// Server to client
    pub fn rewrite_clientbound(&self, tag: u8, data: &[u8], pos: usize) -> Result<RewriteOutcome> {
        self.rewrite(Direction::Clientbound, tag, data, pos)
    }

    /// Client to server
    pub fn rewrite_serverbound(&self, tag: u8, data: &[u8], pos: usize) -> Result<RewriteOutcome> {
        self.rewrite(Direction::Serverbound, tag, data, pos)
    }

    /// Rewrite the payload starting at `pos` (just after the packet tag).
    ///
    /// Packets without entity ids come back `Unchanged`. A payload too short
    /// for its schema is an error for this packet only; the translator is not
    /// touched until every field has decoded.
    pub fn rewrite(&self, direction: Direction, tag: u8, data: &[u8], pos: usize) -> Result<RewriteOutcome> {
        let unchanged = RewriteOutcome::Unchanged { rewind_to: pos };
        let Some(packet) = PacketId::from_u8(tag) else {
            return Ok(unchanged);
        };
        let Some(strategy) = self.strategies.get(direction, packet) else {
            return Ok(unchanged);
        };

        match *strategy {
            RewriteStrategy::Field(schema) => self.rewrite_field(direction, packet, schema, data, pos),
            RewriteStrategy::Pickup => self.rewrite_pickup(direction, packet, data, pos),
            RewriteStrategy::Settings => self.rewrite_settings(direction, packet, data, pos),
            RewriteStrategy::Transaction => self.rewrite_transaction(direction, packet, data, pos),
        }
    }

    fn rewrite_field(
        &self,
        direction: Direction,
        packet: PacketId,
        schema: FieldSchema,
        data: &[u8],
        pos: usize,
    ) -> Result<RewriteOutcome> {
        let mut reader = BinaryReader::at(data, pos);
        for field in schema.leading {
            field.skip(&mut reader)?;
        }
        let leading = reader.consumed_since(pos);
        let original = schema.id.read(&mut reader)?;

        if schema.zero_is_none && original == 0 {
            return Ok(RewriteOutcome::Unchanged { rewind_to: pos });
        }
        let rewritten = self.translate(direction, original);
        if rewritten == original {
            return Ok(RewriteOutcome::Unchanged { rewind_to: pos });
        }

        let tail = match schema.tail {
            Tail::Copy => reader.read_remaining(),
            Tail::None => {
                if !reader.is_empty() {
                    debug!(?packet, dropped = reader.remaining(), "discarding bytes after entity id");
                }
                &[]
            }
        };

        let mut writer = BinaryWriter::with_capacity(leading.len() + 10 + tail.len());
        writer.write_bytes(leading);
        schema.id.write(&mut writer, rewritten);
        writer.write_bytes(tail);

        self.report(direction, packet, original, rewritten);
        Ok(RewriteOutcome::Replaced(writer.freeze()))
    }

    fn rewrite_pickup(&self, direction: Direction, packet: PacketId, data: &[u8], pos: usize) -> Result<RewriteOutcome> {
        let mut reader = BinaryReader::at(data, pos);
        let item = reader.read_var_u64()?;
        let actor = reader.read_var_u64()?;

        let new_item = self.translate(direction, item);
        let new_actor = self.translate(direction, actor);
        if new_item == item && new_actor == actor {
            return Ok(RewriteOutcome::Unchanged { rewind_to: pos });
        }

        let mut writer = BinaryWriter::with_capacity(20);
        writer.write_var_u64(new_item);
        writer.write_var_u64(new_actor);

        self.report(direction, packet, item, new_item);
        self.report(direction, packet, actor, new_actor);
        Ok(RewriteOutcome::Replaced(writer.freeze()))
    }

    fn rewrite_settings(&self, direction: Direction, packet: PacketId, data: &[u8], pos: usize) -> Result<RewriteOutcome> {
        const FLAG_WORDS: usize = 5;

        let mut reader = BinaryReader::at(data, pos);
        for _ in 0..FLAG_WORDS {
            FieldKind::VarU32.skip(&mut reader)?;
        }
        let flags = reader.consumed_since(pos);
        let original = IdEncoding::U64Le.read(&mut reader)?;

        let rewritten = self.translate(direction, original);
        if rewritten == original {
            return Ok(RewriteOutcome::Unchanged { rewind_to: pos });
        }

        let mut writer = BinaryWriter::with_capacity(flags.len() + 8);
        writer.write_bytes(flags);
        IdEncoding::U64Le.write(&mut writer, rewritten);

        self.report(direction, packet, original, rewritten);
        Ok(RewriteOutcome::Replaced(writer.freeze()))
    }

    fn rewrite_transaction(
        &self,
        direction: Direction,
        packet: PacketId,
        data: &[u8],
        pos: usize,
    ) -> Result<RewriteOutcome> {
        let mut reader = BinaryReader::at(data, pos);
        let mut transaction = InventoryTransaction::read(&mut reader)?;
        let Some(original) = transaction.entity_id() else {
            return Ok(RewriteOutcome::Unchanged { rewind_to: pos });
        };

        let rewritten = self.translate(direction, original);
        if rewritten == original {
            return Ok(RewriteOutcome::Unchanged { rewind_to: pos });
        }
        transaction.set_entity_id(rewritten);

        let mut writer = BinaryWriter::with_capacity(data.len().saturating_sub(pos) + 10);
        transaction.write(&mut writer);
        writer.write_bytes(reader.read_remaining());

        self.report(direction, packet, original, rewritten);
        Ok(RewriteOutcome::Replaced(writer.freeze()))
    }

    fn translate(&self, direction: Direction, id: EntityId) -> EntityId {
        match direction {
            Direction::Clientbound => self.translator.translate_to_client(id),
            Direction::Serverbound => self.translator.translate_to_backend(id),
        }
    }

    fn report(&self, direction: Direction, packet: PacketId, original: EntityId, rewritten: EntityId) {
        if original == rewritten {
            return;
        }
        let backend = self.translator.source();
        let client = self.translator.client_label();
        let (from, to) = match direction {
            Direction::Clientbound => (backend.as_str(), client),
            Direction::Serverbound => (client, backend.as_str()),
        };
        self.translator.observer().record_rewrite(from, to, packet, original, rewritten);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{InventoryAction, InventorySource, ItemStack, TransactionData, Vector3};
    use crate::debug::{DebugRecord, RewriteDebugger};

    struct Fixture {
        rewriter: PacketRewriter,
        debugger: Arc<RewriteDebugger>,
    }

    /// Own entity: client id 1, backend id 1000. Counter starts at 7.
    fn fixture() -> Fixture {
        let debugger = Arc::new(RewriteDebugger::new(64));
        let translator = EntityTranslator::new(1, "lobby", 1000)
            .with_observer(debugger.clone())
            .with_first_id(7);
        Fixture {
            rewriter: PacketRewriter::new(Arc::new(translator)),
            debugger,
        }
    }

    impl Fixture {
        fn register(&self, backend_id: EntityId) -> EntityId {
            let client_id = self.rewriter.translator().register(backend_id);
            self.debugger.drain();
            client_id
        }
    }

    fn var_u64(v: u64) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_var_u64(v);
        writer.into_vec()
    }

    fn var_i64(v: i64) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_var_i64(v);
        writer.into_vec()
    }

    fn replaced(outcome: RewriteOutcome) -> Vec<u8> {
        match outcome {
            RewriteOutcome::Replaced(bytes) => bytes.to_vec(),
            other => panic!("expected replacement, got {other:?}"),
        }
    }

    #[test]
    fn test_move_entity_keeps_tail() {
        let f = fixture();
        assert_eq!(f.register(42), 7);

        let tail: Vec<u8> = (0u8..18).collect();
        let mut payload = var_u64(42);
        payload.extend_from_slice(&tail);

        let out = replaced(f.rewriter.rewrite_clientbound(0x12, &payload, 0).unwrap());
        let mut expected = var_u64(7);
        expected.extend_from_slice(&tail);
        assert_eq!(out, expected);
        assert_eq!(
            f.debugger.records(),
            vec![DebugRecord::Rewrite {
                from: "lobby".into(),
                to: "client".into(),
                packet: PacketId::MoveEntity,
                original: 42,
                rewritten: 7,
            }]
        );
    }

    #[test]
    fn test_rewrite_respects_start_position() {
        let f = fixture();
        f.register(42);

        // tag byte in front of the payload
        let mut packet = vec![0x28];
        packet.extend(var_u64(42));
        packet.extend([0xAA, 0xBB]);

        let out = replaced(f.rewriter.rewrite_clientbound(0x28, &packet, 1).unwrap());
        assert_eq!(out, vec![0x07, 0xAA, 0xBB]);
    }

    #[test]
    fn test_pickup_rewrites_both_ids() {
        let f = fixture();
        let translator = f.rewriter.translator();
        // counter lands on 100 and 101
        let translator_ids: Vec<_> = (0..93).map(|i| translator.register(10_000 + i)).collect();
        assert_eq!(translator_ids.last(), Some(&99));
        assert_eq!(translator.register(5), 100);
        assert_eq!(translator.register(6), 101);
        f.debugger.drain();

        let mut payload = var_u64(5);
        payload.extend(var_u64(6));

        let out = replaced(f.rewriter.rewrite_clientbound(0x11, &payload, 0).unwrap());
        let mut expected = var_u64(100);
        expected.extend(var_u64(101));
        assert_eq!(out, expected);
        assert_eq!(f.debugger.rewrite_count(), 2);
    }

    #[test]
    fn test_noop_rewrite_is_unchanged() {
        let f = fixture();
        // own backend id translates, but an unknown id stays as is
        let payload = [var_u64(555), vec![1, 2, 3]].concat();

        let outcome = f.rewriter.rewrite_clientbound(0x12, &payload, 0).unwrap();
        assert_eq!(outcome, RewriteOutcome::Unchanged { rewind_to: 0 });
        assert_eq!(f.debugger.rewrite_count(), 0);

        let original = Bytes::from(payload.clone());
        assert_eq!(outcome.into_payload(&original), original);
    }

    #[test]
    fn test_own_entity_rewritten_both_ways() {
        let f = fixture();
        let out = replaced(f.rewriter.rewrite_clientbound(0x13, &var_u64(1000), 0).unwrap());
        assert_eq!(out, var_u64(1));

        let out = replaced(f.rewriter.rewrite_serverbound(0x13, &var_u64(1), 0).unwrap());
        assert_eq!(out, var_u64(1000));
    }

    #[test]
    fn test_boss_event_signed_id() {
        let f = fixture();
        f.register(300);
        let payload = [var_i64(300), vec![0x02]].concat();

        let out = replaced(f.rewriter.rewrite_clientbound(0x4a, &payload, 0).unwrap());
        assert_eq!(out, [var_i64(7), vec![0x02]].concat());

        let out = replaced(f.rewriter.rewrite_serverbound(0x4a, &out, 0).unwrap());
        assert_eq!(out, payload);
    }

    #[test]
    fn test_clientbound_animate_keeps_action_and_tail() {
        let f = fixture();
        f.register(64);
        // action 300 takes two bytes
        let payload = [vec![0xAC, 0x02], var_u64(64), vec![0x00, 0x00, 0x80, 0x3F]].concat();

        let out = replaced(f.rewriter.rewrite_clientbound(0x2c, &payload, 0).unwrap());
        assert_eq!(out, [vec![0xAC, 0x02], var_u64(7), vec![0x00, 0x00, 0x80, 0x3F]].concat());
    }

    #[test]
    fn test_serverbound_animate_ends_at_id() {
        let f = fixture();
        f.register(64);
        let payload = [vec![0x03], var_u64(7)].concat();

        let out = replaced(f.rewriter.rewrite_serverbound(0x2c, &payload, 0).unwrap());
        assert_eq!(out, [vec![0x03], var_u64(64)].concat());
    }

    #[test]
    fn test_interact_zero_target_untouched() {
        // client id 0 is mapped here, so a lookup would turn 0 into 55
        let debugger = Arc::new(RewriteDebugger::new(16));
        let translator = EntityTranslator::new(1, "lobby", 1000)
            .with_observer(debugger.clone())
            .with_first_id(0);
        assert_eq!(translator.register(55), 0);
        assert_eq!(translator.translate_to_backend(0), 55);
        debugger.drain();

        let rewriter = PacketRewriter::new(Arc::new(translator));
        let payload = [vec![0x04], var_u64(0), vec![0x11, 0x22]].concat();

        let outcome = rewriter.rewrite_serverbound(0x21, &payload, 0).unwrap();
        assert_eq!(outcome, RewriteOutcome::Unchanged { rewind_to: 0 });
        assert!(debugger.is_empty());
    }

    #[test]
    fn test_interact_with_target() {
        let f = fixture();
        f.register(333);
        let payload = [vec![0x02], var_u64(7), vec![0x11, 0x22]].concat();

        let out = replaced(f.rewriter.rewrite_serverbound(0x21, &payload, 0).unwrap());
        assert_eq!(out, [vec![0x02], var_u64(333), vec![0x11, 0x22]].concat());
        assert_eq!(
            f.debugger.records(),
            vec![DebugRecord::Rewrite {
                from: "client".into(),
                to: "lobby".into(),
                packet: PacketId::Interact,
                original: 7,
                rewritten: 333,
            }]
        );
    }

    #[test]
    fn test_adventure_settings_le_id() {
        let f = fixture();
        let mut payload = Vec::new();
        for flag in [0x01u8, 0x00, 0x7F, 0x00, 0x02] {
            payload.push(flag);
        }
        payload.extend_from_slice(&1000u64.to_le_bytes());

        let out = replaced(f.rewriter.rewrite_clientbound(0x37, &payload, 0).unwrap());
        assert_eq!(&out[..5], &payload[..5]);
        assert_eq!(&out[5..], &1u64.to_le_bytes());
    }

    #[test]
    fn test_transaction_use_item_on_entity() {
        let f = fixture();
        f.register(4242);

        let transaction = InventoryTransaction {
            actions: vec![InventoryAction {
                source: InventorySource::Container { window_id: 0 },
                slot: 1,
                old_item: ItemStack::new(267, 0),
                new_item: ItemStack::new(267, 1),
            }],
            data: TransactionData::UseItemOnEntity {
                entity_id: 7,
                action_type: 1,
                hotbar_slot: 1,
                item: ItemStack::new(267, 0),
                player_position: Vector3::new(0.5, 70.0, 0.5),
                click_position: Vector3::default(),
            },
        };
        let mut writer = BinaryWriter::new();
        transaction.write(&mut writer);
        let payload = writer.into_vec();

        let out = replaced(f.rewriter.rewrite_serverbound(0x1e, &payload, 0).unwrap());
        let decoded = InventoryTransaction::read(&mut BinaryReader::new(&out)).unwrap();
        assert_eq!(decoded.entity_id(), Some(4242));
        assert_eq!(decoded.actions, transaction.actions);
    }

    #[test]
    fn test_transaction_keeps_trailing_bytes() {
        let f = fixture();
        f.register(4242);

        let data = |entity_id| TransactionData::UseItemOnEntity {
            entity_id,
            action_type: 1,
            hotbar_slot: 0,
            item: ItemStack::air(),
            player_position: Vector3::default(),
            click_position: Vector3::default(),
        };
        let encode = |entity_id| {
            let mut writer = BinaryWriter::new();
            InventoryTransaction { actions: Vec::new(), data: data(entity_id) }.write(&mut writer);
            writer.write_bytes(&[0xCA, 0xFE]);
            writer.into_vec()
        };

        let out = replaced(f.rewriter.rewrite_serverbound(0x1e, &encode(7), 0).unwrap());
        assert_eq!(out, encode(4242));
        assert_eq!(&out[out.len() - 2..], &[0xCA, 0xFE]);
    }

    #[test]
    fn test_transaction_without_entity_untouched() {
        let f = fixture();
        let transaction = InventoryTransaction { actions: Vec::new(), data: TransactionData::Normal };
        let mut writer = BinaryWriter::new();
        transaction.write(&mut writer);
        let payload = writer.into_vec();

        assert!(f.rewriter.rewrite_serverbound(0x1e, &payload, 0).unwrap().is_unchanged());
    }

    #[test]
    fn test_truncated_payload_is_error() {
        let f = fixture();
        f.register(42);
        let before = f.rewriter.translator().snapshot();

        assert!(f.rewriter.rewrite_clientbound(0x12, &[0x80], 0).is_err());
        assert!(f.rewriter.rewrite_clientbound(0x11, &var_u64(42), 0).is_err());
        assert!(f.rewriter.rewrite_clientbound(0x37, &[0, 0, 0, 0, 0, 1, 2], 0).is_err());
        assert_eq!(f.rewriter.translator().snapshot(), before);
    }

    #[test]
    fn test_untracked_packets_pass_through() {
        let f = fixture();
        let payload = [0xDE, 0xAD];
        // unknown tag, and a tag only tracked in the other direction
        assert!(f.rewriter.rewrite_clientbound(0x01, &payload, 0).unwrap().is_unchanged());
        assert!(f.rewriter.rewrite_clientbound(0x21, &payload, 0).unwrap().is_unchanged());
        assert!(f.rewriter.rewrite_serverbound(0x12, &payload, 0).unwrap().is_unchanged());
    }
}
