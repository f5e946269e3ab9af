//! Common test utilities and helpers
//!
//! Builds a throwaway Arduino15 tree with one installed AVR platform, a
//! sketch project and a config directory pointing the `ano` binary at them.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use arturo::core::environment::Environment;
use arturo::infra::search_path::SearchPath;

/// Package index with an installed `avr` platform and an uninstalled `sam`
pub const PACKAGE_INDEX: &str = r#"{
  "packages": [
    {
      "name": "arduino",
      "maintainer": "Arduino",
      "platforms": [
        {
          "name": "Arduino AVR Boards",
          "architecture": "avr",
          "version": "1.6.9",
          "url": "http://downloads.arduino.cc/cores/avr-1.6.9.tar.bz2",
          "category": "Arduino",
          "toolsDependencies": [
            { "packager": "arduino", "name": "avr-gcc", "version": "7.3.0-atmel3.6.1-arduino7" }
          ]
        },
        {
          "name": "Arduino SAM Boards (32-bits ARM Cortex-M3)",
          "architecture": "sam",
          "version": "1.6.12",
          "url": "http://downloads.arduino.cc/cores/sam-1.6.12.tar.bz2",
          "toolsDependencies": []
        }
      ],
      "tools": [
        {
          "name": "avr-gcc",
          "version": "7.3.0-atmel3.6.1-arduino7",
          "systems": [
            { "host": "x86_64-pc-linux-gnu", "url": "http://example.com/avr-gcc-x86_64-linux.tar.bz2" },
            { "host": "aarch64-linux-gnu", "url": "http://example.com/avr-gcc-aarch64-linux.tar.bz2" },
            { "host": "arm-linux-gnueabihf", "url": "http://example.com/avr-gcc-armhf.tar.bz2" },
            { "host": "i686-pc-linux-gnu", "url": "http://example.com/avr-gcc-i686-linux.tar.bz2" },
            { "host": "x86_64-apple-darwin14", "url": "http://example.com/avr-gcc-darwin.tar.bz2" },
            { "host": "i686-mingw32", "url": "http://example.com/avr-gcc-mingw32.zip" }
          ]
        }
      ]
    }
  ]
}"#;

pub const BOARDS_TXT: &str = "\
menu.cpu=Processor

uno.name=Arduino/Genuino Uno
uno.upload.tool=avrdude
uno.build.mcu=atmega328p
uno.build.f_cpu=16000000L
uno.build.board=AVR_UNO
uno.build.core=arduino
uno.build.variant=standard

nano.name=Arduino Nano
nano.build.board=AVR_NANO
nano.build.core=arduino
nano.build.variant=eightanaloginputs
nano.menu.cpu.atmega328=ATmega328P
nano.menu.cpu.atmega328.build.mcu=atmega328p
";

pub const PLATFORM_TXT: &str = "\
name=Arduino AVR Boards
version=1.6.9
compiler.path=/usr/bin/
compiler.cpp.cmd=avr-g++
build.extra_flags=
recipe.cpp.o.pattern=\"{compiler.path}{compiler.cpp.cmd}\" -mmcu={build.mcu} -DF_CPU={build.f_cpu} -DARDUINO={runtime.ide.version} -DARDUINO_{build.board} -DARDUINO_ARCH_{build.arch} {build.extra_flags} {includes}
tools.avrdude.path={runtime.tools.avrdude.path}
tools.avrdude.cmd.path={path}/bin/avrdude
";

pub const PROGRAMMERS_TXT: &str = "\
avrisp.name=AVR ISP
avrisp.communication=serial
avrisp.protocol=stk500v1
usbasp.name=USBasp
usbasp.communication=usb
usbasp.protocol=usbasp
";

/// A temporary Arduino15 home, sketch folder and config directory
pub struct TestEnvironment {
    /// Arduino15-style root holding the package index and libraries
    pub home: TempDir,
    /// Parent of the `blink` sketch
    pub sketches: TempDir,
    /// `ARTURO_CONFIG_DIR` for the binary under test
    pub config: TempDir,
}

impl TestEnvironment {
    /// Create the full fixture
    pub fn new() -> Self {
        let env = Self {
            home: TempDir::new().expect("Failed to create temp directory"),
            sketches: TempDir::new().expect("Failed to create temp directory"),
            config: TempDir::new().expect("Failed to create temp directory"),
        };
        env.create_hardware();
        env.create_libraries();
        env.create_sketch();
        env.write_config();
        env
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// The `blink` sketch folder
    pub fn project(&self) -> PathBuf {
        self.sketches.path().join("blink")
    }

    /// Installed `avr` platform folder
    pub fn platform_dir(&self) -> PathBuf {
        self.home().join("packages/arduino/hardware/avr/1.6.9")
    }

    /// Write a file under the Arduino15 home
    pub fn create_file(&self, name: &str, content: &str) {
        write(&self.home().join(name), content);
    }

    /// Write a file under the sketch folder
    pub fn create_project_file(&self, name: &str, content: &str) {
        write(&self.project().join(name), content);
    }

    /// Environment searching only the fixture home
    pub fn environment(&self) -> Environment {
        Environment::new(SearchPath::new(vec![self.home().to_path_buf()]))
    }

    /// Run `ano` from the sketch folder against this fixture
    pub fn run_ano(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ano"));
        cmd.current_dir(self.project())
            .env("ARTURO_CONFIG_DIR", self.config.path())
            .env_remove("ARTURO_SEARCH_PATH")
            .env_remove("ARTURO_PROJECT")
            .env_remove("RUST_LOG");
        for arg in args {
            cmd.arg(arg);
        }
        cmd.output().expect("Failed to execute ano")
    }

    fn create_hardware(&self) {
        let platform = self.platform_dir();
        self.create_file("package_index.json", PACKAGE_INDEX);
        self.create_file("preferences.txt", "board=uno\n");
        write(&platform.join("boards.txt"), BOARDS_TXT);
        write(&platform.join("platform.txt"), PLATFORM_TXT);
        write(&platform.join("programmers.txt"), PROGRAMMERS_TXT);
        write(&platform.join("cores/arduino/Arduino.h"), "#include \"pins_arduino.h\"\n");
        write(&platform.join("cores/arduino/main.cpp"), "#include <Arduino.h>\n");
        write(&platform.join("variants/standard/pins_arduino.h"), "");
        write(&platform.join("variants/eightanaloginputs/pins_arduino.h"), "");
        write(&platform.join("libraries/SPI/SPI.h"), "#include <Arduino.h>\n");
        write(&platform.join("libraries/SPI/SPI.cpp"), "#include \"SPI.h\"\n");
        write(&platform.join("libraries/EEPROM/EEPROM.h"), "");
        self.create_file(
            "packages/arduino/tools/avr-gcc/7.3.0-atmel3.6.1-arduino7/bin/avr-g++",
            "",
        );
    }

    fn create_libraries(&self) {
        self.create_file("libraries/Servo/src/Servo.h", "#include <Arduino.h>\n");
        self.create_file("libraries/Servo/src/Servo.cpp", "#include \"Servo.h\"\n");
        self.create_file("libraries/Servo/library.properties", "name=Servo\nversion=1.1.2\n");

        // Display depends on Wire, which only has a header
        self.create_file("libraries/Display/Display.h", "#include <Wire.h>\n");
        self.create_file("libraries/Display/Display.cpp", "#include \"Display.h\"\n");
        self.create_file("libraries/Display/library.properties", "version=2.0.1\n");
        self.create_file("libraries/Wire/Wire.h", "");
        self.create_file("libraries/Wire/library.properties", "version=1.0\n");

        self.create_file("libraries/Sensor-1.2/Sensor.h", "");
        self.create_file("libraries/Sensor-1.2/Sensor.cpp", "");
        self.create_file("libraries/Sensor-2.4/Sensor.h", "");
        self.create_file("libraries/Sensor-2.4/Sensor.cpp", "");

        self.create_file("libraries/NotALibrary/README.md", "");
    }

    fn create_sketch(&self) {
        self.create_project_file(
            "blink.ino",
            "#include <Servo.h>\n#include \"config.h\"\n/*\n#include <Missing.h>\n*/\nvoid setup() {}\nvoid loop() {}\n",
        );
        self.create_project_file("config.h", "#include <SPI.h>\n");
        self.create_project_file("util/helpers.cpp", "#include \"config.h\"\n");
        self.create_project_file("lib/Local/Local.h", "");
        self.create_project_file("lib/Local/Local.cpp", "#include \"Local.h\"\n");
        self.create_project_file(".build_ano2/uno/blink.cpp", "#include <Display.h>\n");
    }

    fn write_config(&self) {
        let content = format!(
            "[search]\npaths = [{:?}]\ninclude_system_path = false\ninclude_arduino_paths = false\n",
            self.home().display().to_string()
        );
        write(&self.config.path().join("config.toml"), &content);
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` to `path`, creating parent folders
pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

/// Stdout of a finished command
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished command
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
