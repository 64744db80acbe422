// demo/src/main.rs

use demo_app::{AnyMessage, DisconnectReason, Heartbeat, Item, PlayerState, Team, REGISTRY};
use netmsg::{EnumValue, NetMessage, ReadBuffer, WriteBuffer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let state = PlayerState {
        name:      "ada".to_string(),
        position:  [1.0, 2.0, -0.5],
        inventory: vec![Item {
            id:    7,
            label: "rope".to_string(),
            count: 3,
        }],
        reason:    EnumValue::Known(DisconnectReason::Timeout),
        team:      Team::Blue.into(),
        alive:     true,
        score:     -20,
    };

    // Frame two messages back to back: id (u32) followed by the body.
    let mut bb = WriteBuffer::new();
    for message in [AnyMessage::from(Heartbeat { client_clock: 42 }), AnyMessage::from(state)] {
        bb.write_u32(message.id());
        message.encode(&mut bb)?;
    }
    let bytes = bb.data();
    println!("encoded {} bytes", bytes.len());

    let mut rb = ReadBuffer::new(&bytes);
    while rb.remaining() > 0 {
        let id = rb.read_u32()?;
        match AnyMessage::decode(id, &mut rb)? {
            AnyMessage::Heartbeat(heartbeat) => println!("heartbeat, clock = {}", heartbeat.client_clock),
            AnyMessage::PlayerState(state) => {
                println!("{} ({:?}) at {:?}", state.name, state.team, state.position);
                for item in &state.inventory {
                    println!("  {} x{}", item.label, item.count);
                }
            }
            other => println!("{} ({})", other.name(), other.id()),
        }
    }

    println!("registry knows {} messages:", REGISTRY.len());
    for entry in REGISTRY.entries() {
        println!("  {:>3} {}", entry.id, entry.name);
    }
    println!("heartbeat id = {}", Heartbeat::ID);
    Ok(())
}
