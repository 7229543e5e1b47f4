use criterion::{black_box, criterion_group, criterion_main, Criterion};
use thor_globe::data::{build_flight_paths, Allegiance, CountryPolygon, Marker};
use thor_globe::geo::GeoPoint;
use thor_globe::map::{Collections, MarkerStyle, ProjectionState, RedrawEngine, Toggles};

struct Scene {
    countries: Vec<CountryPolygon>,
    takeoffs: Vec<Marker>,
    targets: Vec<Marker>,
}

/// A 10° grid of square "countries" and a few hundred missions.
fn scene() -> Scene {
    let mut countries = Vec::new();
    for lon in (-180..180).step_by(10) {
        for lat in (-80..80).step_by(10) {
            let (x, y) = (lon as f64, lat as f64);
            let ring = vec![
                GeoPoint::new(x, y),
                GeoPoint::new(x + 9.0, y),
                GeoPoint::new(x + 9.0, y + 9.0),
                GeoPoint::new(x, y + 9.0),
                GeoPoint::new(x, y),
            ];
            countries.push(CountryPolygon {
                name: format!("{lon},{lat}"),
                rings: vec![ring],
                allegiance: Allegiance::Neutral,
            });
        }
    }

    let takeoffs = (0..300)
        .map(|i| Marker::new(-5.0 + (i % 20) as f64 * 0.5, 50.0 + (i / 20) as f64 * 0.3))
        .collect();
    let targets = (0..300)
        .map(|i| Marker::new(5.0 + (i % 30) as f64, 40.0 + (i / 30) as f64 * 1.5))
        .collect();

    Scene {
        countries,
        takeoffs,
        targets,
    }
}

fn bench_projection(c: &mut Criterion) {
    let mut projection = ProjectionState::new(400.0, 200.0, 1.0, 8.0);
    projection.rotate(-10.0, -45.0);
    let points: Vec<GeoPoint> = (0..1000)
        .map(|i| GeoPoint::new((i as f64 * 0.37) % 360.0 - 180.0, (i as f64 * 0.11) % 180.0 - 90.0))
        .collect();

    c.bench_function("project_1000_points", |b| {
        b.iter(|| {
            for &p in &points {
                black_box(projection.project(p));
                black_box(projection.is_visible(p));
            }
        })
    });

    let ring: Vec<GeoPoint> = (0..=360).map(|i| GeoPoint::new(i as f64 - 180.0, 20.0)).collect();
    c.bench_function("project_line_parallel", |b| {
        b.iter(|| black_box(projection.project_line(black_box(&ring), false)))
    });
}

fn bench_redraw(c: &mut Criterion) {
    let scene = scene();
    let paths = build_flight_paths(&scene.takeoffs, &scene.targets).unwrap_or_default();
    let data = Collections {
        countries: &scene.countries,
        takeoffs: &scene.takeoffs,
        targets: &scene.targets,
        paths: &paths,
    };
    let toggles = Toggles {
        show_graticule: true,
        ..Toggles::default()
    };

    let mut projection = ProjectionState::new(400.0, 200.0, 1.0, 8.0);
    let mut engine = RedrawEngine::new();

    c.bench_function("redraw_populated_scene", |b| {
        b.iter(|| {
            projection.rotate(1.0, 0.0);
            engine.redraw(&projection, data, toggles, MarkerStyle::default());
        })
    });

    c.bench_function("rasterize_200x50", |b| b.iter(|| black_box(engine.rasterize(200, 50))));
}

criterion_group!(benches, bench_projection, bench_redraw);
criterion_main!(benches);
