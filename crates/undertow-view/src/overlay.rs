use bevy::{diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}, prelude::*};

const OVERLAY_ZINDEX: i32 = i32::MAX - 32;

/// Shows the render rate, the current tick or frame and the particle count in the top left corner.
pub(crate) struct StatsOverlayPlugin;

impl Plugin for StatsOverlayPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<FrameTimeDiagnosticsPlugin>() {
            app.add_plugins(FrameTimeDiagnosticsPlugin);
        }

        app
            .init_resource::<ViewStats>()
            .add_systems(Startup, setup)
            .add_systems(Update, update_text);
    }
}

#[derive(Resource)]
pub(crate) struct ViewStats {
    /// What `step` counts, e.g. "tick" or "frame".
    pub step_label: &'static str,
    pub step: u64,
    pub particles: usize,
}

impl Default for ViewStats {
    fn default() -> Self {
        Self {
            step_label: "tick",
            step: 0,
            particles: 0,
        }
    }
}

#[derive(Component)]
struct StatsText;

fn setup(mut commands: Commands) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..Default::default()
        },
        GlobalZIndex(OVERLAY_ZINDEX),
        Text::new(""),
        TextFont {
            font_size: 18.0,
            ..Default::default()
        },
        TextColor(Color::BLACK),
        StatsText,
    ));
}

fn update_text(
    diagnostic: Res<DiagnosticsStore>,
    stats: Res<ViewStats>,
    mut query: Query<&mut Text, With<StatsText>>,
) {
    let fps = diagnostic
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);

    for mut text in &mut query {
        text.0 = format!(
            "FPS: {fps:.1}\n{}: {}\nparticles: {}",
            stats.step_label, stats.step, stats.particles,
        );
    }
}
