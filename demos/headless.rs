use reefcluster::prelude::*;

#[derive(Debug, Clone)]
struct DiveSite {
    name: &'static str,
    max_depth_m: u32,
}

/// Drives the scheduler against an in-process viewport, without any UI
fn main() -> reefcluster::Result<()> {
    reefcluster::init_logging();

    println!("reefcluster headless example");
    println!("============================");

    let catalogue = [
        ("ss-thistlegorm", "SS Thistlegorm", 27.814, 33.921, 32),
        ("ras-mohammed", "Shark & Yolanda Reef", 27.727, 34.257, 30),
        ("jackfish-alley", "Jackfish Alley", 27.752, 34.237, 25),
        ("abu-nuhas", "Abu Nuhas Wrecks", 27.578, 33.930, 28),
        ("blue-hole", "Dahab Blue Hole", 28.572, 34.537, 100),
        ("canyon", "The Canyon", 28.553, 34.522, 50),
        ("elphinstone", "Elphinstone Reef", 25.309, 34.861, 40),
    ];
    let sites: Vec<Site<DiveSite>> = catalogue
        .iter()
        .map(|&(id, name, lat, lng, max_depth_m)| {
            Site::new(id, lat, lng, DiveSite { name, max_depth_m })
        })
        .collect();

    let config = EngineConfig::from_json_str(
        r#"{"clustering": {"min_points": 2, "max_zoom": 12.0, "radius": 50.0},
            "scheduler": {"throttle_interval_ms": 100}}"#,
    )?;
    let mut scheduler = UpdateScheduler::new(config)?;
    let results = scheduler.subscribe();

    let mut adapter = ViewportAdapter::new(Viewport::new(
        LatLng::new(27.0, 34.0),
        6.0,
        Point::new(1024.0, 768.0),
    ))
    .with_margin(25.0);

    let start = Instant::now();
    scheduler.sync_viewport(&adapter, start);
    scheduler.on_sites_changed(sites, start);

    // Pan east in a burst of small steps; only the last camera is clustered.
    for step in 1..=8u64 {
        adapter.surface_mut().pan(Point::new(15.0, 0.0));
        scheduler.sync_viewport(&adapter, start + Duration::from_millis(step * 8));
    }
    scheduler.poll(start + Duration::from_millis(100));

    let result = scheduler.result();
    println!(
        "\n{} clusters, {} individual sites",
        result.clusters.len(),
        result.individual_sites.len()
    );
    for marker in adapter.cull(&result) {
        match &marker.kind {
            MarkerKind::Cluster(cluster) => println!(
                "   cluster {} ({} sites) at ({:.0}, {:.0})",
                cluster.id, cluster.count, marker.screen.x, marker.screen.y
            ),
            MarkerKind::Site(site) => println!(
                "   {} ({}m) at ({:.0}, {:.0})",
                site.payload.name, site.payload.max_depth_m, marker.screen.x, marker.screen.y
            ),
        }
    }

    // Activate the first cluster, as a tap would, and recluster at the new zoom
    let mut router = InteractionRouter::new()
        .with_site_handler(|site: &Site<DiveSite>| println!("   load details for {}", site.id));
    if let Some(cluster) = result.clusters.first() {
        let action = router.handle(MarkerEvent::ClusterActivated(cluster.clone()), &mut adapter);
        println!("\n{:?}", action);
        scheduler.sync_viewport(&adapter, start + Duration::from_millis(200));
        scheduler.flush();
    }

    // A depth filter changes the id set, so it is clustered right away
    let deep: Vec<Site<DiveSite>> = scheduler
        .sites()
        .iter()
        .filter(|site| site.payload.max_depth_m >= 30)
        .map(|site| site.as_ref().clone())
        .collect();
    scheduler.on_sites_changed(deep, start + Duration::from_millis(250));

    let zoomed = scheduler.result();
    for site in zoomed.individual_sites.iter().take(1) {
        router.handle(MarkerEvent::SiteActivated(Arc::clone(site)), &mut adapter);
    }

    println!(
        "\n{} snapshots published, stats: {:?}",
        results.try_iter().count(),
        scheduler.stats()
    );
    Ok(())
}
