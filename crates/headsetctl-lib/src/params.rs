//! Parsing of user-supplied values: device ids, equalizer curves,
//! parametric bands and capability parameters.

use crate::capability::{Capability, CapabilityKind};
use crate::dispatch::FeatureParam;
use crate::error::{DeviceError, Result};
use crate::result::{FilterType, ParametricBand};

fn parse_int(token: &str) -> Option<i64> {
    let token = token.trim();
    match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

/// Parse `"vid:pid"` (also `.`, `,` or space separated). Ids are hex,
/// with or without a `0x` prefix, the way `lsusb` prints them.
pub fn parse_two_ids(input: &str) -> Option<(u16, u16)> {
    let tokens: Vec<&str> = input
        .split([':', '.', ',', ' '])
        .filter(|t| !t.is_empty())
        .collect();
    let [a, b] = tokens.as_slice() else {
        return None;
    };
    let id = |t: &str| {
        let hex = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
        u16::from_str_radix(hex, 16).ok()
    };
    Some((id(a)?, id(b)?))
}

/// Parse an equalizer curve: floats separated by commas, spaces or braces.
///
/// Tokens that are not finite numbers are rejected.
pub fn parse_float_data(input: &str) -> Result<Vec<f32>> {
    input
        .split([' ', ',', '{', '}', '\n', '\r'])
        .filter(|t| !t.is_empty())
        .map(|t| match t.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(DeviceError::invalid_parameter(format!(
                "Couldn't parse equalizer value: {t}"
            ))),
        })
        .collect()
}

fn parse_band(band: &str) -> Result<ParametricBand> {
    let tokens: Vec<&str> = band
        .split([',', ' '])
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() < 2 || tokens.len() > 4 {
        return Err(DeviceError::invalid_parameter(format!(
            "Band \"{}\" needs FREQ,GAIN[,Q[,TYPE]]",
            band.trim()
        )));
    }

    let number = |what: &str, t: &str| match t.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DeviceError::invalid_parameter(format!(
            "Couldn't parse {what}: {t}"
        ))),
    };

    let mut out = ParametricBand::new(number("frequency", tokens[0])?, number("gain", tokens[1])?);
    if let Some(q) = tokens.get(2) {
        out.q_factor = number("q factor", q)?;
    }
    if let Some(t) = tokens.get(3) {
        out.filter_type = FilterType::from_name(t).ok_or_else(|| {
            DeviceError::invalid_parameter(format!("Unknown filter type: {t}"))
        })?;
    }
    Ok(out)
}

/// Parse parametric bands: `FREQ,GAIN[,Q[,TYPE]]` separated by `;`.
///
/// `"reset"` (or an empty string) yields no bands, which resets the
/// device's parametric equalizer.
pub fn parse_parametric_equalizer(input: &str) -> Result<Vec<ParametricBand>> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("reset") {
        return Ok(Vec::new());
    }
    input
        .split(';')
        .filter(|b| !b.trim().is_empty())
        .map(parse_band)
        .collect()
}

/// Parse the command-line value of `cap` into a typed parameter.
pub fn parse_param(cap: Capability, input: &str) -> Result<FeatureParam> {
    match cap {
        Capability::Equalizer => parse_float_data(input).map(FeatureParam::Equalizer),
        Capability::ParametricEqualizer => {
            parse_parametric_equalizer(input).map(FeatureParam::Parametric)
        }
        _ if cap.kind() == CapabilityKind::Info && input.trim().is_empty() => {
            Ok(FeatureParam::None)
        }
        _ => {
            let v = match input.trim() {
                "on" | "true" => Some(1),
                "off" | "false" => Some(0),
                t => parse_int(t).and_then(|v| i32::try_from(v).ok()),
            };
            v.map(FeatureParam::Int).ok_or_else(|| {
                DeviceError::invalid_parameter(format!(
                    "{} expects {}, got \"{}\"",
                    cap.name(),
                    cap.info().value_hint,
                    input.trim()
                ))
            })
        }
    }
}

/// `0xAB 0xCD ` style dump, used when tracing HID traffic.
pub fn hexdump(data: &[u8]) -> String {
    data.iter().map(|b| format!("0x{b:02X} ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn two_ids() {
        assert_eq!(parse_two_ids("0x1b1c:0x0a4f"), Some((0x1b1c, 0x0a4f)));
        assert_eq!(parse_two_ids("1b1c:0a4f"), Some((0x1b1c, 0x0a4f)));
        assert_eq!(parse_two_ids("046d 0a66"), Some((0x046d, 0x0a66)));
        assert_eq!(parse_two_ids("0x046d"), None);
        assert_eq!(parse_two_ids("1:2:3"), None);
        assert_eq!(parse_two_ids("zz:01"), None);
        assert_eq!(parse_two_ids("0x10000:1"), None);
        assert_eq!(parse_two_ids(""), None);
    }

    #[test]
    fn float_data() {
        assert_eq!(parse_float_data("1, -2.5 3").unwrap(), vec![1.0, -2.5, 3.0]);
        assert_eq!(parse_float_data("{0,0}").unwrap(), vec![0.0, 0.0]);
        assert!(parse_float_data("").unwrap().is_empty());
        let err = parse_float_data("1,abc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(parse_float_data("inf").is_err());
    }

    #[test]
    fn parametric_bands() {
        let bands = parse_parametric_equalizer("100,3,0.7,lowshelf;1000,-2").unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].filter_type, FilterType::LowShelf);
        assert_eq!(bands[0].q_factor, 0.7);
        assert_eq!(bands[1].frequency, 1000.0);
        assert_eq!(bands[1].filter_type, FilterType::Peaking);
        assert_eq!(bands[1].q_factor, 1.0);

        assert!(parse_parametric_equalizer("reset").unwrap().is_empty());
        assert!(parse_parametric_equalizer("100").is_err());
        assert!(parse_parametric_equalizer("100,1,1,bandpass").is_err());
    }

    #[test]
    fn param_per_capability() {
        assert_eq!(
            parse_param(Capability::Sidetone, "64").unwrap(),
            FeatureParam::Int(64)
        );
        assert_eq!(
            parse_param(Capability::Lights, "off").unwrap(),
            FeatureParam::Int(0)
        );
        assert_eq!(
            parse_param(Capability::Battery, "").unwrap(),
            FeatureParam::None
        );
        assert_eq!(
            parse_param(Capability::Equalizer, "1,2").unwrap(),
            FeatureParam::Equalizer(vec![1.0, 2.0])
        );
        let err = parse_param(Capability::InactiveTime, "soon").unwrap_err();
        assert_eq!(err.details(), "inactive time expects 0-90, got \"soon\"");
    }

    #[test]
    fn hexdump_format() {
        assert_eq!(hexdump(&[0x00, 0xb0, 0xff]), "0x00 0xB0 0xFF ");
        assert_eq!(hexdump(&[]), "");
    }
}
