use pixel_retro::{
    bridge::{RunOutcome, ScriptPhase},
    config::CoreConfig,
    engine::{ScriptEngine, ScriptSystem},
    testing::RecordingFrontend,
    video::Surface,
    Core, CoreState, EngineError, Joypad,
};
use std::{fs, path::{Path, PathBuf}, rc::Rc};

/// Tiny blocking interpreter over `0.txt`: one command per line.
///
/// - `size W H` screen size, must come first
/// - `fill N` paint the screen with byte N and present it
/// - `wait` present frames until START is pressed
/// - `bgm` start a square wave
struct LineScript {
    dir: PathBuf,
    lines: Vec<String>,
    pc: usize,
    width: u32,
    height: u32,
    screen: Vec<u8>,
}

impl LineScript {
    fn new() -> Self {
        Self {
            dir: PathBuf::new(),
            lines: vec![],
            pc: 0,
            width: 0,
            height: 0,
            screen: vec![],
        }
    }
}

impl ScriptEngine for LineScript {
    fn set_archive_path(&mut self, path: &Path) {
        self.dir = path.to_path_buf();
    }

    fn open_script(&mut self) -> i32 {
        let Ok(text) = fs::read_to_string(self.dir.join("0.txt")) else {
            return -1;
        };
        self.lines = text.lines().map(str::to_string).collect();
        let Some(size) = self.lines.first() else {
            return -2;
        };
        let dims: Vec<u32> = size.split_whitespace().skip(1).filter_map(|s| s.parse().ok()).collect();
        if dims.len() != 2 {
            return -2;
        }
        self.width = dims[0];
        self.height = dims[1];
        self.screen = vec![0; (self.width * self.height * 4) as usize];
        self.pc = 1;
        0
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn surface(&self) -> Surface<'_> {
        Surface {
            width: self.width,
            height: self.height,
            pitch: self.width as usize * 4,
            pixels: &self.screen,
        }
    }

    fn init(&mut self, _sys: &mut ScriptSystem<'_>) -> Result<(), EngineError> {
        if self.lines.is_empty() {
            return Err(EngineError::MissingResource("0.txt".into()));
        }
        Ok(())
    }

    fn execute_label(&mut self, sys: &mut ScriptSystem<'_>) {
        while let Some(line) = self.lines.get(self.pc).cloned() {
            self.pc += 1;
            let mut words = line.split_whitespace();
            match words.next() {
                Some("fill") => {
                    let v = words.next().and_then(|w| w.parse().ok()).unwrap_or(0);
                    self.screen.fill(v);
                    sys.flip(self);
                }
                Some("wait") => {
                    while !sys.joypad(0).contains(Joypad::START) {
                        sys.flip(self);
                    }
                }
                Some("bgm") => {
                    let mut phase = 0u32;
                    sys.open_audio(Box::new(move |buf: &mut [u8]| {
                        for s in buf.chunks_exact_mut(2) {
                            let v: i16 = if phase % 100 < 50 { 1000 } else { -1000 };
                            s.copy_from_slice(&v.to_ne_bytes());
                            phase += 1;
                        }
                        buf.len()
                    }));
                    sys.pause_audio(false);
                }
                _ => {}
            }
        }
    }

    fn reset(&mut self) {
        self.pc = 1;
        self.screen.fill(0);
    }
}

fn content(script: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("0.txt"), script).unwrap();
    dir
}

fn start(dir: &Path) -> (Core<LineScript>, Rc<RecordingFrontend>) {
    let fe = Rc::new(RecordingFrontend::new());
    let mut core = Core::with_config(
        LineScript::new(),
        fe.clone(),
        CoreConfig {
            stack_bytes: 256 * 1024,
            ..CoreConfig::default()
        },
    );
    core.init().unwrap();
    assert!(core.load_game(Some(&dir.join("0.txt"))));
    (core, fe)
}

#[test]
fn test_script_runs_frame_by_frame() {
    let dir = content("size 40 30\nfill 1\nfill 2\nwait\nfill 3\n");
    let (mut core, fe) = start(dir.path());
    assert_eq!(core.state(), CoreState::GameLoaded);

    assert_eq!(core.run(), Some(RunOutcome::Presented));
    assert_eq!(core.run(), Some(RunOutcome::Presented));
    assert_eq!(core.phase(), Some(ScriptPhase::Running));

    // script blocks in `wait` without ever blocking the host
    for _ in 0..20 {
        assert_eq!(core.run(), Some(RunOutcome::Presented));
    }
    fe.press(Joypad::START);
    core.run();
    assert_eq!(core.run(), Some(RunOutcome::Terminated));
    assert_eq!(core.phase(), Some(ScriptPhase::Finished));

    let frames = fe.frames();
    assert!(frames.iter().all(|f| (f.width, f.height, f.pitch) == (40, 30, 160)));
    assert_eq!(frames.first().map(|f| f.first_byte), Some(1));
    assert_eq!(frames.last().map(|f| f.first_byte), Some(3));
    assert_eq!(core.run(), Some(RunOutcome::Skipped));
}

#[test]
fn test_script_audio_is_pulled_independently() {
    let dir = content("size 8 8\nbgm\nfill 9\nwait\n");
    let (mut core, fe) = start(dir.path());
    core.run();
    for _ in 0..5 {
        assert_eq!(core.audio_pull(), 256);
    }
    let batches = fe.audio_batches();
    assert_eq!(batches.len(), 5);
    assert!(batches.iter().all(|(s, n)| s.len() == 512 && *n == 256));
    assert_eq!(batches[0].0[0], 1000);
    assert_eq!(batches[0].0[50], -1000);
}

#[test]
fn test_rejected_content() {
    let empty = tempfile::tempdir().unwrap();
    let fe = Rc::new(RecordingFrontend::new());
    let mut core = Core::new(LineScript::new(), fe);
    core.init().unwrap();
    assert!(!core.load_game(Some(&empty.path().join("0.txt"))));
    assert_eq!(core.state(), CoreState::Initialized);

    let bad = content("fill 1\n");
    assert!(!core.load_game(Some(&bad.path().join("0.txt"))));

    let good = content("size 2 2\nfill 5\n");
    assert!(core.load_game(Some(&good.path().join("0.txt"))));
    assert_eq!(core.av_info().geometry.base_width, 2);
}

#[test]
fn test_reset_restarts_script() {
    let dir = content("size 4 4\nfill 1\nfill 2\nfill 3\n");
    let (mut core, fe) = start(dir.path());
    core.run();
    core.run();
    core.reset();
    core.run();
    core.run();
    let bytes: Vec<u8> = fe.frames().iter().map(|f| f.first_byte).collect();
    assert_eq!(bytes, vec![1, 2, 1, 2]);
}
