//! End-to-end packaging runs against a synthetic game tree.

use std::cell::RefCell;
use std::fs::{self, File};
use std::path::Path;

use chronopack::installer::InstallerCompiler;
use chronopack::pipeline::{run_release, NullObserver, Pipeline, PipelineObserver, PipelineOptions};
use chronopack::profile::{ArchiveKind, PackagingProfile, ReleaseConfig};
use chronopack::{ErrorKind, PackError, PackResult, Step};
use tempfile::TempDir;
use zip::{CompressionMethod, ZipArchive};

const BINARIES: &[&str] = &["ChronoRage.exe", "ChronoRageDemo.exe", "Core.dll", "lua52.dll"];

const DEMO_TRACKS: &[&str] = &["01_adrenaline_full_loop.ogg", "06_downhill_full.ogg"];

const PACKAGING_INI: &str = r#"
[release]
product = ChronoRage
profiles = full, demo

[paths]
vfs_dir = Data
binaries_dir = Build/Release
installs_dir = Installs
payloads = oalinst.exe, vcredist_x86.exe
payload_trees = dxsetup
script_dir = Build
installer_dir = Build
manifest_source = VFS-ChronoRage_release.xml
manifest_target = VFS-ChronoRage.xml

[profile.full]
staging_dir = Build/Release/ChronoRage
binaries = ChronoRage.exe, Core.dll, lua52.dll
installer_script = _makeInstall.nsi
installer_output = ChronoRage_press_preview.exe

[profile.full.data]
root = Data/ChronoRageData
dirs = ., Explosions, Musics
suffixes = .tga, .tex, .ogg, .world, .font.xml
exclude = DemoGUI.pbk, waves-demo.xml, notes.txt

[profile.full.dict]
root = Data/ChronoRageData/Dictionaries
dirs = .
suffixes = .xml
exclude = DemoGUI.pbk, waves-demo.xml

[profile.full.levels]
root = Data/ChronoRageData/Levels
dirs = ., .\Waves
suffixes = .xml, .world
forbidden_suffixes = .world.xml
exclude = DemoGUI.pbk, waves-demo.xml

[profile.full.shaders]
root = Shaders
dirs = bin
suffixes = .obj
exclude = DemoGUI.pbk, waves-demo.xml

[profile.demo]
staging_dir = Build/Release/ChronoRageDemo
binaries = ChronoRageDemo.exe, Core.dll, lua52.dll
installer_script = _makeDemoInstall.nsi
installer_output = ChronoRage_demo.exe

[profile.demo.data]
root = Data/ChronoRageData
dirs = ., Explosions, Musics, Musics/Demo
suffixes = .tga, .tex, .ogg, .world, .font.xml
exclude = 01_adrenaline_full_loop.ogg, 06_downhill_full.ogg
exclude_scope = Musics

[profile.demo.dict]
root = Data/ChronoRageData/Dictionaries
dirs = .
suffixes = .xml

[profile.demo.levels]
root = Data/ChronoRageData/Levels
dirs = ., .\Waves
suffixes = .xml, .world
forbidden_suffixes = .world.xml

[profile.demo.shaders]
root = Shaders
dirs = bin
suffixes = .obj
"#;

/// Writes the expected installer into the script directory.
struct FakeMakensis {
    output_name: String,
    calls: RefCell<Vec<String>>,
}

impl FakeMakensis {
    fn for_profile(profile: &PackagingProfile) -> Self {
        Self {
            output_name: profile.installer.output_name.clone(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl InstallerCompiler for FakeMakensis {
    fn compile(&self, script_dir: &Path, script: &str) -> PackResult<()> {
        self.calls.borrow_mut().push(script.to_string());
        fs::write(script_dir.join(&self.output_name), format!("setup from {}", script)).unwrap();
        Ok(())
    }
}

/// Records step banners in order.
#[derive(Default)]
struct BannerLog {
    banners: RefCell<Vec<String>>,
}

impl PipelineObserver for BannerLog {
    fn step_started(&self, profile: &str, step: Step) {
        self.banners.borrow_mut().push(format!("{}: {}", profile, step));
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lay out a small game tree under `root`.
fn game_tree(root: &Path) {
    let data = root.join("Data/ChronoRageData");
    write(&data.join("ExplosionA.tga"), "tga");
    write(&data.join("ExplosionA.tex"), "tex");
    write(&data.join("notes.txt"), "notes");
    write(&data.join("DemoGUI.pbk"), "demo gui");
    write(&data.join("Arena.world"), "world");
    write(&data.join("Menu.font.xml"), "font");
    write(&data.join("Explosions/Big.tex"), "big");
    for track in DEMO_TRACKS {
        write(&data.join("Musics").join(track), "full track");
        write(&data.join("Musics/Demo").join(track), "demo track");
    }
    write(&data.join("Musics/menu_loop.ogg"), "menu");

    write(&data.join("Dictionaries/english.xml"), "<dict/>");
    write(&data.join("Levels/wave1.xml"), "<wave/>");
    write(&data.join("Levels/wave1.world"), "world");
    write(&data.join("Levels/wave1.world.xml"), "<world/>");
    write(&data.join("Levels/Waves/waves-demo.xml"), "<demo/>");
    write(&data.join("Levels/Waves/waves-full.xml"), "<full/>");

    write(&root.join("Shaders/bin/glow.obj"), "obj");
    write(&root.join("Shaders/bin/glow.hlsl"), "hlsl");

    write(&root.join("Data/VFS-ChronoRage_release.xml"), "<vfs release/>");
    write(&root.join("Data/VFS-ChronoRage.xml"), "<vfs dev/>");

    for binary in BINARIES {
        write(&root.join("Build/Release").join(binary), binary);
    }

    write(&root.join("Installs/oalinst.exe"), "openal");
    write(&root.join("Installs/vcredist_x86.exe"), "vcredist");
    write(&root.join("Installs/dxsetup/DXSETUP.exe"), "dx");
    write(&root.join("Installs/dxsetup/.svn/entries"), "svn");

    write(&root.join("Build/_makeInstall.nsi"), "Name full");
    write(&root.join("Build/_makeDemoInstall.nsi"), "Name demo");
}

fn setup() -> (TempDir, ReleaseConfig) {
    let temp = TempDir::new().unwrap();
    game_tree(temp.path());
    let config = ReleaseConfig::parse(PACKAGING_INI, temp.path()).unwrap();
    (temp, config)
}

fn fake_compiler(profile: &PackagingProfile) -> Box<dyn InstallerCompiler> {
    Box::new(FakeMakensis::for_profile(profile))
}

fn entry_names(path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[test]
fn test_release_runs_both_profiles() {
    let (temp, config) = setup();
    let observer = BannerLog::default();

    let report = run_release(
        &config,
        &[],
        &fake_compiler,
        PipelineOptions::default(),
        &observer,
    )
    .unwrap();

    assert_eq!(report.profiles.len(), 2);
    let banners = observer.banners.borrow();
    assert_eq!(banners.len(), 16);
    assert_eq!(banners[0], "full: Packing Data");
    assert_eq!(banners[7], "full: Make Installer");
    assert_eq!(banners[8], "demo: Packing Data");

    let build = temp.path().join("Build");
    assert_eq!(
        fs::read_to_string(build.join("ChronoRage_press_preview.exe")).unwrap(),
        "setup from _makeInstall.nsi"
    );
    assert_eq!(
        fs::read_to_string(build.join("ChronoRage_demo.exe")).unwrap(),
        "setup from _makeDemoInstall.nsi"
    );

    for name in ["ChronoRage", "ChronoRageDemo"] {
        let stage = build.join("Release").join(name);
        for kind in ArchiveKind::ALL {
            assert!(stage.join(kind.archive_filename("ChronoRage")).is_file());
        }
    }
}

#[test]
fn test_data_archive_membership() {
    let (_temp, config) = setup();
    let profile = config.profile("full").unwrap();
    let compiler = FakeMakensis::for_profile(profile);

    let report = Pipeline::new(profile, &compiler)
        .run(PipelineOptions { skip_installer: true }, &NullObserver)
        .unwrap();

    let data = &report.archives[0];
    assert_eq!(data.kind, ArchiveKind::Data);
    let names = entry_names(&data.path);
    assert_eq!(names, data.entries);
    assert_eq!(
        names,
        vec![
            "Arena.world",
            "ExplosionA.tex",
            "ExplosionA.tga",
            "Menu.font.xml",
            "Explosions/Big.tex",
            "Musics/01_adrenaline_full_loop.ogg",
            "Musics/06_downhill_full.ogg",
            "Musics/menu_loop.ogg",
        ]
    );
    assert!(!names.contains(&"notes.txt".to_string()));
    assert!(!names.contains(&"DemoGUI.pbk".to_string()));
}

#[test]
fn test_archives_are_store_mode() {
    let (_temp, config) = setup();
    let profile = config.profile("full").unwrap();
    let compiler = FakeMakensis::for_profile(profile);
    Pipeline::new(profile, &compiler)
        .run(PipelineOptions { skip_installer: true }, &NullObserver)
        .unwrap();

    let path = profile.archive_path(ArchiveKind::Data);
    let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
        assert_eq!(entry.size(), entry.compressed_size());
    }
}

#[test]
fn test_levels_forbidden_suffix() {
    let (_temp, config) = setup();
    let profile = config.profile("full").unwrap();
    let compiler = FakeMakensis::for_profile(profile);
    Pipeline::new(profile, &compiler)
        .run(PipelineOptions { skip_installer: true }, &NullObserver)
        .unwrap();

    let names = entry_names(&profile.archive_path(ArchiveKind::Levels));
    assert_eq!(
        names,
        vec!["wave1.world", "wave1.xml", "Waves/waves-full.xml"]
    );
}

#[test]
fn test_demo_exclusion_scoped_to_musics() {
    let (_temp, config) = setup();
    let profile = config.profile("demo").unwrap();
    let compiler = FakeMakensis::for_profile(profile);
    Pipeline::new(profile, &compiler)
        .run(PipelineOptions { skip_installer: true }, &NullObserver)
        .unwrap();

    let names = entry_names(&profile.archive_path(ArchiveKind::Data));
    for track in DEMO_TRACKS {
        assert!(!names.contains(&format!("Musics/{}", track)));
        assert!(names.contains(&format!("Musics/Demo/{}", track)));
    }
    assert!(names.contains(&"Musics/menu_loop.ogg".to_string()));
    // The demo profile doesn't exclude the demo-only assets
    assert!(entry_names(&profile.archive_path(ArchiveKind::Levels))
        .contains(&"Waves/waves-demo.xml".to_string()));
}

#[test]
fn test_staged_files_match_sources() {
    let (temp, config) = setup();
    run_release(
        &config,
        &["full".to_string()],
        &fake_compiler,
        PipelineOptions::default(),
        &NullObserver,
    )
    .unwrap();

    let profile = config.profile("full").unwrap();
    let stage = &profile.staging_dir;
    for binary in &profile.binaries {
        assert_eq!(
            fs::read(stage.join(binary)).unwrap(),
            fs::read(profile.binaries_dir.join(binary)).unwrap()
        );
    }
    assert!(!stage.join("ChronoRageDemo.exe").exists());

    assert_eq!(
        fs::read_to_string(stage.join("VFS-ChronoRage.xml")).unwrap(),
        "<vfs release/>"
    );
    assert!(!stage.join("VFS-ChronoRage_release.xml").exists());

    assert!(stage.join("oalinst.exe").is_file());
    assert!(stage.join("vcredist_x86.exe").is_file());
    assert!(stage.join("dxsetup/DXSETUP.exe").is_file());
    assert!(!stage.join("dxsetup/.svn").exists());

    // Only the selected profile ran
    assert!(!temp.path().join("Build/Release/ChronoRageDemo").exists());
}

#[test]
fn test_rerun_replaces_artifacts() {
    let (temp, config) = setup();
    let options = PipelineOptions::default();

    let first = run_release(&config, &[], &fake_compiler, options, &NullObserver).unwrap();
    let profile = config.profile("full").unwrap();
    let data_path = profile.archive_path(ArchiveKind::Data);
    let first_bytes = fs::read(&data_path).unwrap();

    // Junk left in the staging directory is overwritten, not appended to
    fs::write(profile.manifest_path(), "stale manifest").unwrap();
    write(
        &profile.staging_dir.join("dxsetup/obsolete.cab"),
        "from an older release",
    );

    let second = run_release(&config, &[], &fake_compiler, options, &NullObserver).unwrap();
    for (a, b) in first.profiles.iter().zip(&second.profiles) {
        for (x, y) in a.archives.iter().zip(&b.archives) {
            assert_eq!(x.entries, y.entries);
            assert_eq!(entry_names(&y.path), y.entries);
        }
    }
    assert_eq!(fs::read(&data_path).unwrap(), first_bytes);
    assert_eq!(
        fs::read_to_string(profile.manifest_path()).unwrap(),
        "<vfs release/>"
    );
    assert!(!profile.staging_dir.join("dxsetup/obsolete.cab").exists());

    let leftovers: Vec<_> = fs::read_dir(&profile.staging_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
    assert!(temp.path().join("Build/ChronoRage_press_preview.exe").is_file());
}

#[test]
fn test_explosion_scenario() {
    let temp = TempDir::new().unwrap();
    let content = temp.path().join("content");
    write(&content.join("ExplosionA.tga"), "tga");
    write(&content.join("ExplosionA.tex"), "tex");
    write(&content.join("notes.txt"), "notes");

    let spec = chronopack::profile::ArchiveSpec::new(
        ArchiveKind::Data,
        &content,
        ["."],
        [".tga", ".tex", ".txt"],
    )
    .with_exclusion(chronopack::profile::Exclusion::by_name(["notes.txt"]));

    let packed = chronopack::archive::pack_archive(
        &spec,
        "ChronoRage",
        &temp.path().join("stage"),
        "full",
        &NullObserver,
    )
    .unwrap();

    let mut names = entry_names(&packed.path);
    names.sort();
    assert_eq!(names, vec!["ExplosionA.tex", "ExplosionA.tga"]);
}

#[test]
fn test_missing_binary_aborts_release() {
    let (temp, config) = setup();
    fs::remove_file(temp.path().join("Build/Release/lua52.dll")).unwrap();
    let observer = BannerLog::default();

    let err = run_release(
        &config,
        &[],
        &fake_compiler,
        PipelineOptions::default(),
        &observer,
    )
    .unwrap_err();

    match &err {
        PackError::MissingSource(path) => assert!(path.ends_with("lua52.dll")),
        other => panic!("expected MissingSource, got {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::FileSystem);

    let banners = observer.banners.borrow();
    assert_eq!(banners.last().unwrap(), "full: Copy Binaries");
    assert!(!banners.iter().any(|b| b.starts_with("demo:")));
    assert!(!temp.path().join("Build/ChronoRage_press_preview.exe").exists());
}

#[test]
fn test_missing_content_directory_is_fatal() {
    let (temp, config) = setup();
    fs::remove_dir_all(temp.path().join("Shaders/bin")).unwrap();

    let err = run_release(
        &config,
        &[],
        &fake_compiler,
        PipelineOptions::default(),
        &NullObserver,
    )
    .unwrap_err();
    assert!(matches!(err, PackError::MissingSource(_)));

    let profile = config.profile("full").unwrap();
    assert!(profile.archive_path(ArchiveKind::Levels).is_file());
    assert!(!profile.archive_path(ArchiveKind::Shaders).exists());
}
