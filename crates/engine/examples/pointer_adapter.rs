//! Adapter-style composition: a host hands over an already-allocated event
//! object, and presentation capabilities are grafted onto it through the
//! public `add`/`create` surface.

use engine::Capability;
use object::{Instance, Member};
use serde_json::{Value, json};

fn position() -> Capability {
    Capability::with_members(
        "position",
        [(
            "position",
            Member::method(|obj, _args| {
                let x = obj.value("client_x").cloned().unwrap_or(json!(0));
                let y = obj.value("client_y").cloned().unwrap_or(json!(0));
                Ok(json!([x, y]))
            }),
        )],
    )
}

fn button_detection() -> Capability {
    Capability::with_members(
        "button-detection",
        [(
            "is_left_button",
            Member::method(|obj, _args| {
                let button = obj.value("button").and_then(Value::as_i64);
                Ok(json!(button == Some(0)))
            }),
        )],
    )
}

fn main() -> engine::Result<()> {
    // The placeholder object as a host environment would hand it over.
    let mut event = Instance::new();
    event.set_slot("client_x", Member::value(120).instantiate());
    event.set_slot("client_y", Member::value(80).instantiate());
    event.set_slot("button", Member::value(0).instantiate());

    let pointer = position();
    pointer.brings(&[button_detection()]);
    let mut event = pointer.create_on(event)?;

    println!("position:    {}", event.invoke("position", &[])?);
    println!("left button: {}", event.invoke("is_left_button", &[])?);
    Ok(())
}
