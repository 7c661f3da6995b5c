mod common;

use common::{scripted_client, Op, ScriptedTransport};
use vfdctl::{
    with_session, ControlCommand, Dispatcher, DriveConfig, DriveConfigBuilder, DriveError,
    RegisterName, ValidationError,
};

const MAX: f64 = 20000.0;

fn config() -> DriveConfig {
    DriveConfigBuilder::new().with_max_output(MAX).build().unwrap()
}

#[test]
fn test_out_of_range_reference_never_writes() {
    for value in [-1.0, MAX + 1.0, f64::NAN, f64::INFINITY] {
        let transport = ScriptedTransport::new();

        let result = with_session(transport.clone(), |session| {
            Dispatcher::new(session, MAX).set_reference(value)
        });

        assert!(
            matches!(
                result,
                Err(DriveError::Validation(ValidationError::ReferenceOutOfRange { .. }))
            ),
            "{value} was accepted"
        );
        assert!(transport.writes().is_empty(), "{value} reached the bus");
    }
}

#[test]
fn test_reference_wider_than_register_never_writes() {
    let transport = ScriptedTransport::new();

    // A loose bound must not let a setpoint saturate to 0xFFFF
    let result = with_session(transport.clone(), |session| {
        Dispatcher::new(session, 100000.0).set_reference(70000.0)
    });

    assert!(matches!(
        result,
        Err(DriveError::Validation(ValidationError::ReferenceOverflow { .. }))
    ));
    assert!(transport.writes().is_empty());

    let raw = with_session(transport.clone(), |session| {
        Dispatcher::new(session, 100000.0).set_reference(65535.0)
    })
    .unwrap();
    assert_eq!(raw, 65535);
    assert_eq!(transport.writes(), vec![(1, 65535)]);
}

#[test]
fn test_rejected_reference_does_not_open_the_port() {
    let transport = ScriptedTransport::new();
    let client = scripted_client(&transport, config());

    assert!(client.set_reference(-1.0).is_err());
    assert!(client.set_reference(MAX + 1.0).is_err());
    assert!(transport.ops().is_empty());
}

#[test]
fn test_reference_bounds_write_exactly_once() {
    for (value, raw) in [(0.0, 0u16), (MAX, 20000u16), (1234.9, 1234u16)] {
        let transport = ScriptedTransport::new();
        let client = scripted_client(&transport, config());

        assert_eq!(client.set_reference(value).unwrap(), raw);
        assert_eq!(transport.writes(), vec![(1, raw)]);
        assert!(transport.reads().is_empty(), "no read-back expected");
    }
}

#[test]
fn test_second_reference_register() {
    let transport = ScriptedTransport::new();
    let client = scripted_client(&transport, config());

    client
        .set_reference_on(RegisterName::Reference2, 500.0)
        .unwrap();
    assert_eq!(transport.writes(), vec![(2, 500)]);
}

#[test]
fn test_read_only_register_is_not_a_reference_target() {
    let transport = ScriptedTransport::new();
    let client = scripted_client(&transport, config());

    let result = client.set_reference_on(RegisterName::StatusWord, 1.0);
    assert!(matches!(
        result,
        Err(DriveError::Validation(ValidationError::NotWritable("status_word")))
    ));
    assert!(transport.ops().is_empty());
}

#[test]
fn test_each_command_is_one_control_word_write() {
    let expected = [
        (ControlCommand::Start, 0x0477),
        (ControlCommand::Stop, 0x0476),
        (ControlCommand::EmergencyStop, 0x0470),
        (ControlCommand::ResetFault, 0x04F6),
    ];

    for (command, code) in expected {
        let transport = ScriptedTransport::new();
        let client = scripted_client(&transport, config());

        client.send(command).unwrap();
        assert_eq!(
            transport.ops(),
            vec![
                Op::Connect,
                Op::Write {
                    address: 0,
                    value: code
                },
                Op::Close
            ],
            "{command}"
        );
    }
}

#[test]
fn test_dispatcher_shorthands_share_one_session() {
    let transport = ScriptedTransport::new();

    with_session(transport.clone(), |session| {
        let mut dispatcher = Dispatcher::new(session, MAX);
        dispatcher.reset_fault()?;
        dispatcher.start()?;
        dispatcher.stop()?;
        dispatcher.emergency_stop()?;
        dispatcher.send_command(0, 0x0001)
    })
    .unwrap();

    assert_eq!(
        transport.writes(),
        vec![(0, 0x04F6), (0, 0x0477), (0, 0x0476), (0, 0x0470), (0, 0x0001)]
    );
    assert_eq!(transport.closes(), 1);
}

#[test]
fn test_failed_command_write_is_reported() {
    let transport = ScriptedTransport::new().with_failing_address(0);
    let client = scripted_client(&transport, config());

    let err = client.send(ControlCommand::Start).unwrap_err();
    assert!(matches!(err, DriveError::RegisterWrite { address: 0, .. }));
    assert!(err.to_string().contains("0x0477"));
    assert_eq!(transport.closes(), 1);
}
