// main.rs — skybox creator window: face list, 3D preview, menus and status bar

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide the console in release builds

use clap::Parser;
use glam::Vec2;
use skybox_creator::config::{CliArgs, ViewerConfig};
use skybox_creator::geometry::CubeFace;
use skybox_creator::i18n::{self, tr, tr_with};
use skybox_creator::mesh::Subdivision;
use skybox_creator::project::{self, ProjectError, SkyboxProject, SourceImage, SourceMode};
use skybox_creator::projection::ProjectionMode;
use skybox_creator::renderer::Renderer;
use skybox_creator::viewer::SkyboxViewer;

use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy},
    window::WindowBuilder,
};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tga", "tex"];

#[derive(Debug, Clone, Copy)]
enum LoadTarget {
    Face(CubeFace),
    Stretch,
}

/// A decoded image coming back from a loader thread.
struct LoadedImage {
    target: LoadTarget,
    path: PathBuf,
    result: Result<DynamicImage, ProjectError>,
}

enum UiAction {
    PickFace(CubeFace),
    RotateFace(CubeFace),
    FlipFace(CubeFace),
    PickStretch,
    RotateStretch,
    FlipStretch,
    ClearFace(CubeFace),
    SetMode(SourceMode),
    BulkImport,
    Generate,
    Exit,
}

enum Status {
    Info(String),
    Error(String),
}

struct App {
    config: ViewerConfig,
    viewer: SkyboxViewer,
    project: SkyboxProject,
    title: String,
    overwrite: bool,
    status: Option<Status>,
    loading: usize,
    cursor: Vec2,
}

impl App {
    fn error(&mut self, key: &str, err: impl std::fmt::Display) {
        let message = tr_with(key, &[("err", err.to_string())]);
        log::error!("{message}");
        self.status = Some(Status::Error(message));
    }
}

fn init_logging(config: &ViewerConfig) {
    let env = env_logger::Env::default().default_filter_or(config.log_filter());
    let mut builder = env_logger::Builder::from_env(env);
    // an explicit level beats RUST_LOG
    if config.log_level.is_some() {
        builder.parse_filters(config.log_filter());
    }
    builder.init();
}

fn main() {
    let args = CliArgs::parse();
    let (config, config_error) = match ViewerConfig::resolve(&args) {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = ViewerConfig::default();
            config.apply_cli_overrides(&args);
            (config, Some(e))
        }
    };

    init_logging(&config);
    if let Some(e) = config_error {
        log::warn!("using default settings: {e}");
    }
    i18n::init(config.lang.clone());

    let event_loop = EventLoopBuilder::<LoadedImage>::with_user_event().build();
    let proxy = event_loop.create_proxy();
    let window = match WindowBuilder::new()
        .with_title(tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(e) => {
            log::error!("failed to create window: {e}");
            return;
        }
    };

    let viewer = config.build_viewer();
    let mut renderer = match pollster::block_on(Renderer::new(window.clone(), &viewer)) {
        Ok(renderer) => renderer,
        Err(e) => {
            log::error!("failed to initialize renderer: {e}");
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title(&tr("app.title"))
                .set_description(&e.to_string())
                .show();
            return;
        }
    };

    let mut app = App {
        config,
        viewer,
        project: SkyboxProject::new(),
        title: String::new(),
        overwrite: false,
        status: None,
        loading: 0,
        cursor: Vec2::ZERO,
    };

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent { event, .. } => {
                // a drag ends even when the button is released over the UI
                if let WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                } = event
                {
                    app.viewer.pointer_released();
                }

                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.repaint {
                    window.request_redraw();
                }
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        app.viewer.request_redraw();
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        app.viewer.request_redraw();
                    }

                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        app.viewer.pointer_pressed(app.cursor);
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        let logical = position.to_logical::<f32>(window.scale_factor());
                        app.cursor = Vec2::new(logical.x, logical.y);
                        app.viewer.pointer_moved(app.cursor);
                    }

                    WindowEvent::CursorLeft { .. } => {
                        app.viewer.pointer_released();
                    }

                    WindowEvent::DroppedFile(path) => {
                        let target = match app.project.mode {
                            SourceMode::Stretch => Some(LoadTarget::Stretch),
                            SourceMode::SixFaces => path
                                .file_name()
                                .and_then(|name| project::face_for_file_name(&name.to_string_lossy()))
                                .map(LoadTarget::Face),
                        };
                        match target {
                            Some(target) => start_load_image(&proxy, &mut app, target, path),
                            None => {
                                let name = path.display().to_string();
                                log::warn!("no face matches dropped file {name}");
                                app.status = Some(Status::Error(tr_with(
                                    "status.drop_unmatched",
                                    &[("name", name)],
                                )));
                                window.request_redraw();
                            }
                        }
                    }

                    _ => {}
                }
            }

            Event::UserEvent(loaded) => {
                app.loading = app.loading.saturating_sub(1);
                apply_loaded_image(&mut app, &mut renderer, loaded);
                window.request_redraw();
            }

            Event::RedrawRequested(_) => {
                renderer.update_viewer(&app.viewer);

                let triangles = renderer.triangle_count();
                let mut actions = Vec::new();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &mut app, triangles, &mut actions);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::warn!("render error: {e:?}"),
                }

                // projection or subdivision may have moved during the UI pass
                let changed = app.viewer.take_redraw();
                if changed || !actions.is_empty() {
                    window.request_redraw();
                }
                for action in actions {
                    if matches!(action, UiAction::Exit) {
                        *control_flow = ControlFlow::Exit;
                        continue;
                    }
                    apply_action(action, &mut app, &mut renderer, &proxy);
                }
            }

            Event::MainEventsCleared => {
                if app.viewer.take_redraw() {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    });
}

fn image_dialog() -> rfd::FileDialog {
    rfd::FileDialog::new().add_filter(&tr("file.filter.images"), &IMAGE_EXTENSIONS)
}

fn start_load_image(proxy: &EventLoopProxy<LoadedImage>, app: &mut App, target: LoadTarget, path: PathBuf) {
    app.loading += 1;
    let proxy = proxy.clone();
    thread::spawn(move || {
        log::debug!("loading {} in background", path.display());
        let result = project::load_image(&path);
        if proxy.send_event(LoadedImage { target, path, result }).is_err() {
            log::warn!("window closed before the image finished loading");
        }
    });
}

fn apply_loaded_image(app: &mut App, renderer: &mut Renderer, loaded: LoadedImage) {
    let image = match loaded.result {
        Ok(image) => image,
        Err(e) => {
            app.error("error.import", e);
            return;
        }
    };

    let bound = match loaded.target {
        LoadTarget::Face(face) => {
            let img = app.project.set_face_image(face, image, Some(loaded.path));
            renderer.bind_face(face, img)
        }
        LoadTarget::Stretch => {
            // the mode may have changed while the image was decoding
            let is_stretch = app.project.mode == SourceMode::Stretch;
            let img = app.project.set_stretch_image(image, Some(loaded.path));
            if is_stretch {
                renderer.bind_panorama(img)
            } else {
                Ok(())
            }
        }
    };
    match bound {
        Ok(()) => app.status = None,
        Err(e) => app.error("error.texture", e),
    }
}

fn apply_action(
    action: UiAction,
    app: &mut App,
    renderer: &mut Renderer,
    proxy: &EventLoopProxy<LoadedImage>,
) {
    let bound = match action {
        UiAction::PickFace(face) => {
            if let Some(path) = image_dialog().pick_file() {
                start_load_image(proxy, app, LoadTarget::Face(face), path);
            }
            Ok(())
        }
        UiAction::RotateFace(face) => match app.project.rotate_face(face) {
            Some(img) => renderer.bind_face(face, img),
            None => Ok(()),
        },
        UiAction::FlipFace(face) => match app.project.flip_face(face) {
            Some(img) => renderer.bind_face(face, img),
            None => Ok(()),
        },
        UiAction::PickStretch => {
            if let Some(path) = image_dialog().pick_file() {
                start_load_image(proxy, app, LoadTarget::Stretch, path);
            }
            Ok(())
        }
        UiAction::RotateStretch => match app.project.rotate_stretch() {
            Some(img) => renderer.bind_panorama(img),
            None => Ok(()),
        },
        UiAction::FlipStretch => match app.project.flip_stretch() {
            Some(img) => renderer.bind_panorama(img),
            None => Ok(()),
        },
        UiAction::ClearFace(face) => {
            app.project.clear_face(face);
            renderer.clear_face(face);
            Ok(())
        }
        UiAction::SetMode(mode) => {
            app.project.mode = mode;
            app.viewer.set_projection(mode.default_projection());
            // only stretch mode shows the panorama
            match (mode, app.project.stretch_image()) {
                (SourceMode::Stretch, Some(img)) => renderer.bind_panorama(img),
                (SourceMode::Stretch, None) => Ok(()),
                (SourceMode::SixFaces, _) => {
                    renderer.clear_panorama();
                    Ok(())
                }
            }
        }
        UiAction::BulkImport => {
            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                bulk_import(app, renderer, dir);
            }
            Ok(())
        }
        UiAction::Generate => {
            match app
                .project
                .export(&app.config.output_root(), &app.title, app.overwrite)
            {
                Ok(path) => {
                    app.status = Some(Status::Info(tr_with(
                        "status.exported",
                        &[("path", path.display().to_string())],
                    )));
                }
                Err(e) => app.error("error.export", e),
            }
            Ok(())
        }
        UiAction::Exit => Ok(()),
    };

    if let Err(e) = bound {
        app.error("error.texture", e);
    }
}

fn bulk_import(app: &mut App, renderer: &mut Renderer, dir: PathBuf) {
    let faces = match app.project.bulk_import(&dir) {
        Ok(faces) => faces,
        Err(e) => {
            app.error("error.import", e);
            return;
        }
    };

    for &face in &faces {
        if let Some(img) = app.project.face_image(face) {
            if let Err(e) = renderer.bind_face(face, img) {
                app.error("error.texture", e);
                return;
            }
        }
    }
    app.status = Some(Status::Info(tr_with(
        "status.imported",
        &[("count", faces.len().to_string())],
    )));
}

fn source_label(source: Option<&SourceImage>) -> String {
    match source {
        Some(SourceImage { path: Some(path), .. }) => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        Some(SourceImage { path: None, .. }) => tr("panel.in_memory"),
        None => tr("panel.empty"),
    }
}

fn draw_ui(ctx: &egui::Context, app: &mut App, triangles: usize, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            // File
            ui.menu_button(tr("menu.file"), |ui| {
                if ui.button(tr("menu.import_stretch")).clicked() {
                    actions.push(UiAction::SetMode(SourceMode::Stretch));
                    actions.push(UiAction::PickStretch);
                    ui.close_menu();
                }
                if ui.button(tr("menu.bulk_import")).clicked() {
                    actions.push(UiAction::SetMode(SourceMode::SixFaces));
                    actions.push(UiAction::BulkImport);
                    ui.close_menu();
                }
                if ui.button(tr("menu.export")).clicked() {
                    actions.push(UiAction::Generate);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button(tr("menu.exit")).clicked() {
                    actions.push(UiAction::Exit);
                }
            });

            // View
            ui.menu_button(tr("menu.view"), |ui| {
                if ui.button(tr("view.reset")).clicked() {
                    app.viewer.reset_view();
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button(tr("view.projection_mode"), |ui| {
                    let mut mode = app.viewer.projection;
                    ui.radio_value(&mut mode, ProjectionMode::Flat, tr("projection.flat"));
                    ui.radio_value(&mut mode, ProjectionMode::Spherical, tr("projection.spherical"));
                    if mode != app.viewer.projection {
                        app.viewer.set_projection(mode);
                        ui.close_menu();
                    }
                });

                ui.menu_button(tr("view.subdivision"), |ui| {
                    let mut n = app.viewer.subdivision.get();
                    ui.add(egui::Slider::new(&mut n, 1..=Subdivision::MAX / 2));
                    app.viewer.set_subdivision(Subdivision::new(n));
                });

                ui.separator();
                ui.menu_button(tr("view.input_sensitivity"), |ui| {
                    ui.add(
                        egui::Slider::new(&mut app.viewer.sensitivity, 0.1..=5.0)
                            .text(tr("view.multiplier")),
                    );
                    if ui.button(tr("view.reset_1_0")).clicked() {
                        app.viewer.sensitivity = 1.0;
                    }
                });
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if app.loading > 0 {
                ui.label(egui::RichText::new(tr("status.loading")).color(egui::Color32::YELLOW));
                ui.label("|");
            }

            let mode = match app.viewer.projection {
                ProjectionMode::Flat => tr("projection.flat"),
                ProjectionMode::Spherical => tr("projection.spherical"),
            };
            ui.label(format!("{} {mode}", tr("status.mode_prefix")));
            ui.label("|");
            ui.label(tr_with("status.triangles", &[("count", triangles.to_string())]));
            ui.label("|");
            ui.label(tr_with(
                "status.yaw",
                &[("deg", format!("{:.1}", app.viewer.orientation.yaw))],
            ));
            ui.label("|");
            ui.label(tr_with(
                "status.pitch",
                &[("deg", format!("{:.1}", app.viewer.orientation.pitch))],
            ));

            match &app.status {
                Some(Status::Info(msg)) => {
                    ui.label("|");
                    ui.label(egui::RichText::new(msg).color(egui::Color32::GREEN));
                }
                Some(Status::Error(msg)) => {
                    ui.label("|");
                    ui.label(egui::RichText::new(msg).color(egui::Color32::RED));
                }
                None => {}
            }
        });
    });

    egui::SidePanel::left("skybox_panel").resizable(false).show(ctx, |ui| {
        ui.label(tr("panel.title"));
        ui.text_edit_singleline(&mut app.title);
        ui.separator();

        let mut mode = app.project.mode;
        ui.radio_value(&mut mode, SourceMode::SixFaces, tr("panel.mode_six"));
        ui.radio_value(&mut mode, SourceMode::Stretch, tr("panel.mode_stretch"));
        if mode != app.project.mode {
            actions.push(UiAction::SetMode(mode));
        }
        ui.separator();

        match app.project.mode {
            SourceMode::SixFaces => {
                egui::Grid::new("face_rows").num_columns(7).show(ui, |ui| {
                    for face in CubeFace::ALL {
                        ui.label(face.code().to_uppercase());
                        if ui.button(tr("panel.rotate")).clicked() {
                            actions.push(UiAction::RotateFace(face));
                        }
                        if ui.button(tr("panel.flip")).clicked() {
                            actions.push(UiAction::FlipFace(face));
                        }
                        ui.label(format!("{}°", app.project.rotation(face)));
                        if ui.button(tr("panel.browse")).clicked() {
                            actions.push(UiAction::PickFace(face));
                        }
                        ui.label(source_label(app.project.face(face)));
                        if ui.button(tr("panel.clear")).clicked() {
                            actions.push(UiAction::ClearFace(face));
                        }
                        ui.end_row();
                    }
                });
                if ui.button(tr("panel.bulk_import")).clicked() {
                    actions.push(UiAction::BulkImport);
                }
            }
            SourceMode::Stretch => {
                ui.horizontal(|ui| {
                    if ui.button(tr("panel.rotate")).clicked() {
                        actions.push(UiAction::RotateStretch);
                    }
                    if ui.button(tr("panel.flip")).clicked() {
                        actions.push(UiAction::FlipStretch);
                    }
                    if ui.button(tr("panel.browse")).clicked() {
                        actions.push(UiAction::PickStretch);
                    }
                    ui.label(source_label(app.project.stretch()));
                });
            }
        }

        ui.separator();
        if app.project.mode == SourceMode::SixFaces {
            let missing = app.project.missing_faces();
            if !missing.is_empty() {
                let codes: Vec<&str> = missing.iter().map(|face| face.code()).collect();
                ui.label(
                    egui::RichText::new(tr_with("panel.missing", &[("faces", codes.join(", "))]))
                        .color(egui::Color32::YELLOW),
                );
            }
        }
        ui.checkbox(&mut app.overwrite, tr("panel.overwrite"));
        if ui.button(tr("panel.generate")).clicked() {
            actions.push(UiAction::Generate);
        }
    });
}
