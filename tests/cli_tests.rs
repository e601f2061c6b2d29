#[cfg(test)]
mod tests {
    use clap::Parser;
    use deckclock::protocol::ProtocolKind;
    use deckclock::*;

    #[test]
    fn test_args_without_options() {
        let args = Args::parse_from(["test"]);
        assert!(!args.device_list);
        assert_eq!(args.output, None);
        assert_eq!(args.simulate_bpm, None);
    }

    #[test]
    fn test_args_override_settings() {
        let args = Args::parse_from([
            "test",
            "--output",
            "Clock Box",
            "--protocol",
            "notes",
            "--note-channel",
            "9",
            "--interval-ms",
            "250",
            "--simulate-bpm",
            "126.5",
        ]);
        let mut settings = Settings::default();
        args.apply_to(&mut settings);

        assert_eq!(settings.output_device, Some("Clock Box".to_string()));
        assert_eq!(settings.protocol, ProtocolKind::Notes);
        assert_eq!(settings.note_channel, 9);
        assert_eq!(settings.interval_ms, 250);
        assert_eq!(args.simulate_bpm, Some(126.5));
    }

    #[test]
    fn test_args_reject_unknown_protocol() {
        assert!(Args::try_parse_from(["test", "--protocol", "osc"]).is_err());
    }

    #[test]
    fn test_simulation_tempo_must_be_positive() {
        let args = Args::parse_from(["test", "--simulate-bpm", "128"]);
        assert_eq!(args.simulation_bpm().unwrap(), Some(128.0));

        let args = Args::parse_from(["test"]);
        assert_eq!(args.simulation_bpm().unwrap(), None);

        for bad in ["0", "-5", "NaN", "inf"] {
            let flag = format!("--simulate-bpm={}", bad);
            let args = Args::parse_from(["test", flag.as_str()]);
            assert!(
                matches!(args.simulation_bpm(), Err(ClockError::InvalidConfig(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_valid_device_binding() {
        let devices = vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()];
        assert!(validate_device("Device 2", &devices).is_ok());
    }

    #[test]
    fn test_invalid_device_binding() {
        let devices = vec!["Mock Device 1".to_string()];
        let error = validate_device("Nonexistent Device", &devices).unwrap_err();
        assert!(error.contains("Nonexistent Device"));
        assert!(error.contains("Mock Device 1"));
    }
}
