use demo_app::{
    AnyMessage, ChatLine, DisconnectReason, Heartbeat, Item, Loadout, Ping, PlayerState, Snapshot, Team, TreeNode,
    REGISTRY,
};
use netmsg::{DecodeError, DispatchError, EncodeError, EnumValue, IntWidth, NetMessage, WireEnum, WriteBuffer};
use netmsg_compiler::{value::Value, Compiler, CompilerOptions};
use proptest::prelude::*;

const SCHEMA: &str = include_str!("../schema/messages.msg");

fn player(name: &str, reason: EnumValue<DisconnectReason>) -> PlayerState {
    PlayerState {
        name:      name.to_string(),
        position:  [1.5, -2.0, 0.25],
        inventory: vec![
            Item {
                id:    1,
                label: "rope".to_string(),
                count: 2,
            },
            Item {
                id:    2,
                label: String::new(),
                count: 0,
            },
        ],
        reason,
        team:      Team::Red.into(),
        alive:     true,
        score:     -7,
    }
}

#[test]
fn heartbeat_is_eight_little_endian_bytes() {
    let heartbeat = Heartbeat { client_clock: 42 };
    let bytes = heartbeat.to_bytes().unwrap();
    assert_eq!(bytes, [42, 0, 0, 0, 0, 0, 0, 0]);

    let entry = REGISTRY.get(1).unwrap();
    assert_eq!(entry.name, "Heartbeat");
    assert_eq!(AnyMessage::from_bytes(1, &bytes), Ok(AnyMessage::Heartbeat(heartbeat)));
}

#[test]
fn empty_string_round_trip() {
    let chat = ChatLine { text: String::new() };
    let bytes = chat.to_bytes().unwrap();
    assert_eq!(bytes, [0, 0, 0, 0]);
    assert_eq!(ChatLine::from_bytes(&bytes), Ok(chat));
}

#[test]
fn marker_message_has_no_body() {
    assert_eq!(Ping {}.to_bytes().unwrap(), Vec::<u8>::new());
    assert_eq!(AnyMessage::from_bytes(2, &[]), Ok(AnyMessage::Ping(Ping {})));
}

#[test]
fn enum_widths_follow_the_schema() {
    assert_eq!(DisconnectReason::WIDTH, IntWidth::W8);
    assert_eq!(Team::WIDTH, IntWidth::W8);
    assert_eq!(DisconnectReason::from_value(5), Some(DisconnectReason::Timeout));
    assert_eq!(DisconnectReason::from_value(1), None);
    assert_eq!(DisconnectReason::ServerFull.to_value(), 6);
}

#[test]
fn player_state_round_trip() {
    let state = player("ada", DisconnectReason::Kicked.into());
    let bytes = state.to_bytes().unwrap();
    assert_eq!(PlayerState::from_bytes(&bytes), Ok(state.clone()));
    assert_eq!(AnyMessage::from_bytes(3, &bytes), Ok(AnyMessage::PlayerState(state)));
}

#[test]
fn unknown_enum_values_survive() {
    let state = player("bob", EnumValue::Unknown(200));
    let bytes = state.to_bytes().unwrap();

    let decoded = PlayerState::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.reason, EnumValue::Unknown(200));
    assert!(decoded.reason.is_unknown());
    // Fields after the enum still line up
    assert_eq!(decoded.team, EnumValue::Known(Team::Red));
    assert_eq!(decoded.score, -7);
    assert_eq!(decoded.to_bytes().unwrap(), bytes);
}

#[test]
fn unknown_enum_values_must_fit_the_width() {
    let state = player("eve", EnumValue::Unknown(300));
    assert_eq!(
        state.to_bytes(),
        Err(EncodeError::OutOfRange { value: 300, ty: "u8" })
    );
}

#[test]
fn failed_encode_keeps_the_frame_buffer_intact() {
    let mut bb = WriteBuffer::new();
    AnyMessage::from(Heartbeat { client_clock: 42 }).encode(&mut bb).unwrap();
    let before = bb.as_slice().to_vec();

    let bad = AnyMessage::from(player("mallory", EnumValue::Unknown(300)));
    assert_eq!(bad.encode(&mut bb), Err(EncodeError::OutOfRange { value: 300, ty: "u8" }));
    assert_eq!(bb.as_slice(), &before[..]);

    // Nested failures unwind the outer message too
    let snapshot = Snapshot {
        tick:        1,
        players:     vec![player("eve", EnumValue::Unknown(999))],
        checksums:   vec![],
        server_time: 0.0,
        drift:       0,
        lag:         0,
        offset:      0,
    };
    assert!(snapshot.encode(&mut bb).is_err());
    assert_eq!(bb.data(), before);
}

#[test]
fn truncated_input_never_panics() {
    let bytes = player("carol", DisconnectReason::Timeout.into()).to_bytes().unwrap();
    for len in 0..bytes.len() {
        let err = PlayerState::from_bytes(&bytes[..len]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated { .. } | DecodeError::LengthOverrun { .. }
        ));
    }
}

#[test]
fn decode_at_advances_the_cursor() {
    let mut bytes = Heartbeat { client_clock: 1 }.to_bytes().unwrap();
    bytes.extend(ChatLine { text: "hi".into() }.to_bytes().unwrap());

    let (heartbeat, cursor) = Heartbeat::decode_at(&bytes, 0).unwrap();
    assert_eq!(heartbeat.client_clock, 1);
    assert_eq!(cursor, 8);

    let (chat, cursor) = ChatLine::decode_at(&bytes, cursor).unwrap();
    assert_eq!(chat.text, "hi");
    assert_eq!(cursor, bytes.len());
}

#[test]
fn registry_is_sorted_and_complete() {
    let ids: Vec<u32> = REGISTRY.ids().collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert!(!REGISTRY.contains(100));
    assert_eq!(AnyMessage::from_bytes(100, &[]), Err(DispatchError::UnknownId(100)));
    assert_eq!(AnyMessage::from(Item { id: 0, label: String::new(), count: 0 }).name(), "Item");
}

#[test]
fn recursive_messages_through_arrays() {
    let tree = TreeNode {
        value:    1,
        children: vec![
            TreeNode {
                value:    2,
                children: vec![],
            },
            TreeNode {
                value:    3,
                children: vec![TreeNode {
                    value:    4,
                    children: vec![],
                }],
            },
        ],
    };
    let bytes = tree.to_bytes().unwrap();
    assert_eq!(TreeNode::from_bytes(&bytes), Ok(tree));
}

#[test]
fn generated_code_agrees_with_dynamic_codec() {
    let mut compiler = Compiler::new(CompilerOptions {
        namespace: Some("Game".to_string()),
        ..CompilerOptions::default()
    });
    compiler.add_source("messages.msg", SCHEMA).unwrap();
    let schema = compiler.validate().unwrap();

    let snapshot = Snapshot {
        tick:        99,
        players:     vec![player("ada", DisconnectReason::Timeout.into())],
        checksums:   vec![[1, 2, 3, 4], [5, 6, 7, 8]],
        server_time: 12.5,
        drift:       -1,
        lag:         300,
        offset:      -40_000_000_000,
    };
    let bytes = snapshot.to_bytes().unwrap();

    let value = Value::decode_frame(&schema, Snapshot::ID, &bytes).unwrap();
    assert_eq!(value.get("tick"), Some(&Value::UInt(99)));
    assert_eq!(value.get("drift"), Some(&Value::Int(-1)));
    assert_eq!(value.encode(&schema).unwrap(), bytes);
}

fn item() -> impl Strategy<Value = Item> {
    (any::<u32>(), ".{0,12}", any::<u16>()).prop_map(|(id, label, count)| Item { id, label, count })
}

fn loadout() -> impl Strategy<Value = Loadout> {
    let team = prop_oneof![Just(Team::Red), Just(Team::Blue)];
    (
        any::<u8>(),
        prop::collection::vec(".{0,8}", 0..4),
        prop::collection::vec(team, 0..4),
        prop::array::uniform2(any::<u8>()),
        prop::array::uniform2(item()),
        prop::array::uniform3(".{0,6}"),
        prop::collection::vec(any::<bool>(), 0..6),
        prop::collection::vec(any::<u64>(), 0..4),
        any::<u16>(),
    )
        .prop_map(|(slot, tags, teams, history, hands, labels, flags, stamps, version)| Loadout {
            slot,
            tags,
            teams: teams.into_iter().map(EnumValue::from).collect(),
            history: history.map(|raw| EnumValue::from_raw(u64::from(raw))),
            hands,
            labels,
            flags,
            stamps,
            acks: [Ping {}, Ping {}],
            version,
        })
}

fn player_state() -> impl Strategy<Value = PlayerState> {
    (
        ".{0,16}",
        prop::array::uniform3(-1.0e6f32..1.0e6),
        prop::collection::vec(item(), 0..4),
        any::<u8>(),
        prop_oneof![Just(Team::Red), Just(Team::Blue)],
        any::<bool>(),
        any::<i32>(),
    )
        .prop_map(|(name, position, inventory, reason, team, alive, score)| PlayerState {
            name,
            position,
            inventory,
            reason: EnumValue::from_raw(u64::from(reason)),
            team: team.into(),
            alive,
            score,
        })
}

proptest! {
    #[test]
    fn player_state_round_trips(state in player_state()) {
        let bytes = state.to_bytes().unwrap();
        prop_assert_eq!(PlayerState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn loadout_round_trips(loadout in loadout()) {
        let bytes = loadout.to_bytes().unwrap();
        let (decoded, cursor) = Loadout::decode_at(&bytes, 0).unwrap();
        prop_assert_eq!(cursor, bytes.len());
        prop_assert_eq!(&decoded, &loadout);
        prop_assert_eq!(AnyMessage::from_bytes(Loadout::ID, &bytes).unwrap(), AnyMessage::Loadout(loadout));
    }

    #[test]
    fn snapshot_round_trips(
        tick in any::<u32>(),
        players in prop::collection::vec(player_state(), 0..3),
        checksums in prop::collection::vec(any::<[u8; 4]>(), 0..5),
        server_time in -1.0e9f64..1.0e9,
        drift in any::<i8>(),
        lag in any::<i16>(),
        offset in any::<i64>(),
    ) {
        let snapshot = Snapshot { tick, players, checksums, server_time, drift, lag, offset };
        let bytes = snapshot.to_bytes().unwrap();
        let (decoded, cursor) = Snapshot::decode_at(&bytes, 0).unwrap();
        prop_assert_eq!(cursor, bytes.len());
        prop_assert_eq!(decoded, snapshot);
    }
}
