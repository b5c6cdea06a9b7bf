use glam::Vec2;
use gridbump::*;

fn main() {
    env_logger::init();

    let mut world = CollisionWorld::new(WorldConfig { cell_size: 32.0, ellipse_vertices: 16 });

    // A wall layer between the seeker and its target.
    let layer = TileLayer {
        name: "walls".to_owned(),
        tiles: vec![TileDef::rect(60.0, -80.0, 70.0, 80.0)],
    };
    world.enable_tile_collisions(&layer, Some("Solid")).expect("fresh layer");

    let seeker = world.spawn(EntityDesc {
        kind: "Seeker".to_owned(),
        pos: Vec2::ZERO,
        shape: ShapeDesc::Circle { radius: 4.0 },
        ..Default::default()
    });

    let target = Vec2::new(140.0, 0.0);
    let mut bias = AvoidBias::new();

    for frame in 0..60 {
        // The frame scheduler flips the shared avoidance side periodically so
        // crowds of seekers do not all turn the same way forever.
        if frame % 15 == 0 {
            bias.flip();
        }
        world.go(seeker, target, 8.0, None, &bias);
        let pos = world.entity(seeker).map(Entity::pos).unwrap_or_default();
        println!("frame {frame:2}: pos=({:7.2}, {:7.2})", pos.x, pos.y);
        if pos.distance(target) < 0.5 {
            println!("reached target after {} frames", frame + 1);
            break;
        }
    }
}
