use ecowitt_core::units::{INHG_TO_HPA, MPH_TO_MS};
use ecowitt_core::{
    CompassPoint, FormValues, PayloadDecoder, UnitNormalizer, UnknownFieldPolicy,
};

const SAMPLE: &[u8] = b"PASSKEY=LA5ZAQUAHNGEDOOW0DAEROOV8VEZIETI&stationtype=EasyWeatherPro_V5.1.3&runtime=1240&dateutc=2024-06-16+16:32:08&tempinf=70.0&humidityin=48&baromrelin=29.920&baromabsin=29.565&tempf=67.8&humidity=47&winddir=196&windspeedmph=0.22&windgustmph=1.12&maxdailygust=4.47&solarradiation=142.55&uv=1&rainratein=0.000&eventrainin=0.000&hourlyrainin=0.000&dailyrainin=0.000&weeklyrainin=0.000&monthlyrainin=0.000&yearlyrainin=0.000&totalrainin=0.000&vpd=0.153&wh65batt=0&freq=868M&model=WS2900_V2.02.03&interval=60";

#[test]
fn sample_report_end_to_end() {
    let form = FormValues::parse(SAMPLE);
    let raw = PayloadDecoder::new(UnknownFieldPolicy::Reject)
        .decode(&form)
        .unwrap();
    let obs = UnitNormalizer::new(-90).normalize(raw);

    assert_eq!(obs.wind_direction, Some(106));
    assert_eq!(obs.compass_point(), Ok(Some(CompassPoint::EastSouthEast)));
    assert!((obs.pressure_relative.unwrap().0 - 29.92 * INHG_TO_HPA).abs() < 1e-6);
    assert!((obs.wind_speed.unwrap().0 - 0.22 * MPH_TO_MS).abs() < 1e-9);
    assert_eq!(obs.daily_rain.unwrap().0, 0.0);
    assert_eq!(obs.interval, Some(jiff::SignedDuration::from_secs(60)));
    assert_eq!(obs.model.as_deref(), Some("WS2900_V2.02.03"));
}

#[test]
fn decoder_and_normalizer_are_shareable_across_threads() {
    let decoder = PayloadDecoder::default();
    let normalizer = UnitNormalizer::default();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let form = FormValues::parse(format!("winddir={}", i * 90).as_bytes());
                let raw = decoder.decode(&form).unwrap();
                normalizer.normalize(raw).wind_direction
            })
        })
        .collect();

    let directions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(directions, [Some(270), Some(0), Some(90), Some(180)]);
}
